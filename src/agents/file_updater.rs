use crate::error::{CacheBumpError, Result};
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// What happened to a single target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Content changed (or would change, in dry-run mode)
    Updated { replacements: usize },
    /// No `?v=` suffix for the pattern, or every suffix already carries the token
    PatternNotFound,
    /// The file does not exist; set by the workflow, never by the updater
    Skipped,
    Failed { message: String },
}

impl FileOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, FileOutcome::Updated { .. })
    }
}

/// Matcher for `<pattern>?v=<anything up to the next quote>"`.
///
/// The pattern is a literal filename; regex metacharacters such as the `.` in
/// `app.js` only ever match themselves.
#[derive(Debug, Clone)]
pub struct VersionPattern {
    pattern: String,
    regex: Regex,
}

impl VersionPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let expression = format!(r#"{}\?v=[^"]*""#, regex::escape(pattern));
        let regex = Regex::new(&expression).map_err(|e| {
            CacheBumpError::Config(format!("Invalid pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Rewrite every occurrence with `token`. Returns the new content and how
    /// many occurrences actually changed; suffixes already carrying the token
    /// are not counted.
    pub fn rewrite(&self, content: &str, token: &str) -> (String, usize) {
        let replacement = format!("{}?v={}\"", self.pattern, token);
        let changed = self
            .regex
            .find_iter(content)
            .filter(|m| m.as_str() != replacement)
            .count();
        if changed == 0 {
            return (content.to_string(), 0);
        }

        let rewritten = self
            .regex
            .replace_all(content, NoExpand(&replacement))
            .into_owned();
        (rewritten, changed)
    }
}

/// FileUpdater rewrites cache-busting suffixes in place.
pub struct FileUpdater {
    dry_run: bool,
}

impl FileUpdater {
    pub fn new() -> Self {
        Self { dry_run: false }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Update one file. Errors are folded into [`FileOutcome::Failed`] so a
    /// broken file never stops the others from being processed.
    pub fn update_file(&self, path: &Path, pattern: &str, token: &str) -> FileOutcome {
        match self.try_update(path, pattern, token) {
            Ok(outcome) => outcome,
            Err(err) => FileOutcome::Failed {
                message: err.to_string(),
            },
        }
    }

    fn try_update(&self, path: &Path, pattern: &str, token: &str) -> Result<FileOutcome> {
        let matcher = VersionPattern::new(pattern)?;
        let content = fs::read_to_string(path)?;

        let (rewritten, replacements) = matcher.rewrite(&content, token);
        if rewritten == content {
            return Ok(FileOutcome::PatternNotFound);
        }

        if !self.dry_run {
            Self::write_atomically(path, &rewritten)?;
        }

        Ok(FileOutcome::Updated { replacements })
    }

    /// Write to a sibling temp file, then rename it over the target.
    fn write_atomically(path: &Path, content: &str) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let permissions = fs::metadata(path)?.permissions();

        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        fs::set_permissions(temp_file.path(), permissions)?;

        temp_file.persist(path).map_err(|e| {
            CacheBumpError::FileUpdate(format!(
                "Failed to replace '{}': {}",
                path.display(),
                e.error
            ))
        })?;

        Ok(())
    }
}

impl Default for FileUpdater {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PAGE: &str = r#"<html>
<head><link href="style.css?v=1"></head>
<body>
<script src="schedule.js?v=abc123"></script>
<script src="vendor.js?v=abc123"></script>
</body>
</html>
"#;

    #[test]
    fn rewrites_only_the_matching_suffix() {
        let matcher = VersionPattern::new("schedule.js").unwrap();
        let (rewritten, count) = matcher.rewrite(PAGE, "def456");

        assert_eq!(count, 1);
        assert_eq!(
            rewritten,
            PAGE.replace("schedule.js?v=abc123\"", "schedule.js?v=def456\"")
        );
        assert!(rewritten.contains(r#"vendor.js?v=abc123""#));
    }

    #[test]
    fn rewrites_every_occurrence() {
        let content = r#"<script src="app.js?v=1"></script><script src="/b/app.js?v="></script>"#;
        let matcher = VersionPattern::new("app.js").unwrap();
        let (rewritten, count) = matcher.rewrite(content, "77");

        assert_eq!(count, 2);
        assert_eq!(
            rewritten,
            r#"<script src="app.js?v=77"></script><script src="/b/app.js?v=77"></script>"#
        );
    }

    #[test]
    fn count_skips_suffixes_already_current() {
        let content = r#"<script src="app.js?v=new"></script><script src="app.js?v=old"></script>"#;
        let matcher = VersionPattern::new("app.js").unwrap();
        let (rewritten, count) = matcher.rewrite(content, "new");

        assert_eq!(count, 1);
        assert_eq!(
            rewritten,
            r#"<script src="app.js?v=new"></script><script src="app.js?v=new"></script>"#
        );

        let (again, count) = matcher.rewrite(&rewritten, "new");
        assert_eq!(count, 0);
        assert_eq!(again, rewritten);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let matcher = VersionPattern::new("schedule.js").unwrap();
        let (once, _) = matcher.rewrite(PAGE, "def456");
        let (twice, _) = matcher.rewrite(&once, "def456");
        assert_eq!(once, twice);
    }

    #[test]
    fn pattern_metacharacters_are_literal() {
        let matcher = VersionPattern::new("app.js").unwrap();
        let content = r#"<script src="appXjs?v=1"></script>"#;
        let (rewritten, count) = matcher.rewrite(content, "2");
        assert_eq!(count, 0);
        assert_eq!(rewritten, content);

        let matcher = VersionPattern::new("bundle(1).js").unwrap();
        let (rewritten, count) = matcher.rewrite(r#"src="bundle(1).js?v=a""#, "b");
        assert_eq!(count, 1);
        assert_eq!(rewritten, r#"src="bundle(1).js?v=b""#);
    }

    #[test]
    fn token_is_inserted_verbatim() {
        let matcher = VersionPattern::new("app.js").unwrap();
        let (rewritten, _) = matcher.rewrite(r#"src="app.js?v=old""#, "$1${0}");
        assert_eq!(rewritten, r#"src="app.js?v=$1${0}""#);
    }

    #[test]
    fn suffix_without_closing_quote_is_ignored() {
        let matcher = VersionPattern::new("app.js").unwrap();
        let content = "src=app.js?v=old>";
        assert_eq!(matcher.rewrite(content, "new"), (content.to_string(), 0));
    }

    #[test]
    fn update_file_writes_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, PAGE).unwrap();

        let outcome = FileUpdater::new().update_file(&path, "schedule.js", "def456");

        assert_eq!(outcome, FileOutcome::Updated { replacements: 1 });
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#"<script src="schedule.js?v=def456"></script>"#));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn update_file_leaves_unmatched_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<script src=\"main.js\"></script>").unwrap();

        let outcome = FileUpdater::new().update_file(&path, "app.js", "def456");

        assert_eq!(outcome, FileOutcome::PatternNotFound);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<script src=\"main.js\"></script>"
        );
    }

    #[test]
    fn same_token_counts_as_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, PAGE).unwrap();

        let outcome = FileUpdater::new().update_file(&path, "schedule.js", "abc123");
        assert_eq!(outcome, FileOutcome::PatternNotFound);
    }

    #[test]
    fn dry_run_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, PAGE).unwrap();

        let outcome = FileUpdater::new()
            .dry_run(true)
            .update_file(&path, "schedule.js", "def456");

        assert!(outcome.is_updated());
        assert_eq!(fs::read_to_string(&path).unwrap(), PAGE);
    }

    #[test]
    fn invalid_utf8_is_reported_as_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, [0x3c, 0xff, 0xfe, 0x3e]).unwrap();

        let outcome = FileUpdater::new().update_file(&path, "app.js", "1");

        assert!(matches!(outcome, FileOutcome::Failed { .. }));
        assert_eq!(fs::read(&path).unwrap(), vec![0x3c, 0xff, 0xfe, 0x3e]);
    }

    #[test]
    fn missing_file_is_reported_as_failure() {
        let dir = tempdir().unwrap();
        let outcome = FileUpdater::new().update_file(&dir.path().join("nope.html"), "app.js", "1");
        match outcome {
            FileOutcome::Failed { message } => assert!(message.starts_with("IO error:")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
