use crate::error::{CacheBumpError, Result};
use jiff::Zoned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Where the run's version token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    Git,
    Timestamp,
    Override,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VersionSource::Git => "git revision",
            VersionSource::Timestamp => "timestamp",
            VersionSource::Override => "override",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionToken {
    pub value: String,
    pub source: VersionSource,
}

impl VersionToken {
    pub fn new(value: impl Into<String>, source: VersionSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    /// Token supplied by the user; must be non-empty and quote-free.
    pub fn from_override(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CacheBumpError::Config(
                "Version token must not be empty".to_string(),
            ));
        }
        if value.contains('"') {
            return Err(CacheBumpError::Config(format!(
                "Version token '{value}' must not contain a double quote"
            )));
        }
        Ok(Self::new(value, VersionSource::Override))
    }

    pub fn timestamp() -> Self {
        Self::new(
            Zoned::now().strftime(TIMESTAMP_FORMAT).to_string(),
            VersionSource::Timestamp,
        )
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// VersionControlAgent asks git for the short revision of the project.
pub struct VersionControlAgent {
    project_path: PathBuf,
    program: String,
}

impl VersionControlAgent {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            program: "git".to_string(),
        }
    }

    /// Use a different executable in place of `git`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Short hash of `HEAD`.
    pub fn short_revision(&self) -> Result<String> {
        let output = self.run_git(&["rev-parse", "--short", "HEAD"])?;
        Self::ensure_success(&output, "git rev-parse")?;
        Self::parse_revision(&output.stdout)
    }

    /// Resolve the token for this run. Never fails: any git problem falls
    /// back to a local `YYYYMMDD-HHMM` timestamp, and the git error is handed
    /// back alongside it for verbose output.
    pub fn resolve_version(&self) -> (VersionToken, Option<CacheBumpError>) {
        match self.short_revision() {
            Ok(hash) => (VersionToken::new(hash, VersionSource::Git), None),
            Err(err) => (VersionToken::timestamp(), Some(err)),
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.program)
            .current_dir(&self.project_path)
            .args(args)
            .output()
            .map_err(|e| {
                CacheBumpError::GitOperation(format!(
                    "Failed to execute '{} {}': {e}",
                    self.program,
                    args.join(" ")
                ))
            })
    }

    fn ensure_success(output: &Output, command: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(CacheBumpError::GitOperation(format!(
            "{} failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }

    fn parse_revision(stdout: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(stdout).map_err(|e| {
            CacheBumpError::GitOperation(format!("git printed a non-UTF-8 revision: {e}"))
        })?;

        let revision = text.trim();
        if revision.is_empty() {
            return Err(CacheBumpError::GitOperation(
                "git printed an empty revision".to_string(),
            ));
        }

        Ok(revision.to_string())
    }
}
