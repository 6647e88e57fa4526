use crate::error::{CacheBumpError, Result};
use crate::utils::PathValidator;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A file to rewrite and the asset filename whose `?v=` suffix gets bumped.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Target {
    /// Path relative to the project directory
    pub path: PathBuf,
    /// Literal asset filename, e.g. `schedule.js`
    pub pattern: String,
}

impl Target {
    pub fn new(path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdaterConfig {
    pub targets: Vec<Target>,
}

impl Default for UpdaterConfig {
    /// Admin panel and client app pages.
    fn default() -> Self {
        Self {
            targets: vec![
                Target::new("admin/index.html", "schedule.js"),
                Target::new("client/index.html", "app.js"),
            ],
        }
    }
}

impl UpdaterConfig {
    /// Read a target list from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CacheBumpError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: UpdaterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(CacheBumpError::Config(
                "At least one [[targets]] entry is required".to_string(),
            ));
        }

        for target in &self.targets {
            PathValidator::validate_relative_target(&target.path)?;

            if target.pattern.trim().is_empty() {
                return Err(CacheBumpError::Config(format!(
                    "Pattern for '{}' must not be empty",
                    target.path.display()
                )));
            }

            // The version value runs up to the next quote, so the filename can't hold one.
            if target.pattern.contains('"') {
                return Err(CacheBumpError::Config(format!(
                    "Pattern '{}' must not contain a double quote",
                    target.pattern
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_targets_cover_admin_and_client() {
        let config = UpdaterConfig::default();
        assert_eq!(
            config.targets,
            vec![
                Target::new("admin/index.html", "schedule.js"),
                Target::new("client/index.html", "app.js"),
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_target_list() {
        let config = UpdaterConfig::from_toml_str(
            r#"
[[targets]]
path = "public/index.html"
pattern = "main.js"

[[targets]]
path = "public/about.html"
pattern = "styles.css"
"#,
        )
        .unwrap();

        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].path, PathBuf::from("public/index.html"));
        assert_eq!(config.targets[1].pattern, "styles.css");
    }

    #[test]
    fn rejects_empty_target_list() {
        let err = UpdaterConfig::from_toml_str("targets = []").unwrap_err();
        assert!(matches!(err, CacheBumpError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = UpdaterConfig::from_toml_str("[[targets]]\npath = ").unwrap_err();
        assert!(matches!(err, CacheBumpError::Toml(_)));
    }

    #[test]
    fn rejects_missing_pattern_field() {
        let err = UpdaterConfig::from_toml_str("[[targets]]\npath = \"a.html\"").unwrap_err();
        assert!(matches!(err, CacheBumpError::Toml(_)));
    }

    #[test]
    fn rejects_unsafe_paths_and_patterns() {
        for (path, pattern) in [
            ("../outside.html", "app.js"),
            ("/srv/index.html", "app.js"),
            ("index.html", " "),
            ("index.html", "app\".js"),
        ] {
            let config = UpdaterConfig {
                targets: vec![Target::new(path, pattern)],
            };
            assert!(
                config.validate().is_err(),
                "expected {path} / {pattern:?} to be rejected"
            );
        }
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cachebump.toml");
        fs::write(
            &path,
            "[[targets]]\npath = \"index.html\"\npattern = \"bundle.js\"\n",
        )
        .unwrap();

        let config = UpdaterConfig::load(&path).unwrap();
        assert_eq!(config.targets, vec![Target::new("index.html", "bundle.js")]);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = UpdaterConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
