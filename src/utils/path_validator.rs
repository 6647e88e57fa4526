use crate::error::{CacheBumpError, Result};
use std::path::{Component, Path, PathBuf};

/// Keeps target rewrites inside the project directory.
pub struct PathValidator;

impl PathValidator {
    /// Validates and canonicalises the project directory.
    pub fn validate_project_path(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            CacheBumpError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(CacheBumpError::ProjectValidation(format!(
                "Path '{}' is not a directory",
                canonical.display()
            )));
        }

        Ok(canonical)
    }

    /// Ensures an existing target file resolves inside the project directory.
    /// Symlinks pointing outside the project are rejected here.
    pub fn validate_target_file(
        file_path: impl AsRef<Path>,
        project_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let project_dir = project_dir.as_ref();

        let canonical_file = file_path.canonicalize().map_err(|e| {
            CacheBumpError::ProjectValidation(format!(
                "Invalid target file '{}': {e}",
                file_path.display()
            ))
        })?;

        let canonical_base = project_dir.canonicalize().map_err(|e| {
            CacheBumpError::ProjectValidation(format!(
                "Invalid project directory '{}': {e}",
                project_dir.display()
            ))
        })?;

        if !canonical_file.starts_with(&canonical_base) {
            return Err(CacheBumpError::ProjectValidation(format!(
                "Target '{}' is outside the project directory",
                file_path.display()
            )));
        }

        if !canonical_file.is_file() {
            return Err(CacheBumpError::ProjectValidation(format!(
                "Target '{}' is not a regular file",
                file_path.display()
            )));
        }

        Ok(canonical_file)
    }

    /// Checks a configured target path before anything touches the disk:
    /// it must be relative and must not climb out with `..`.
    pub fn validate_relative_target(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err(CacheBumpError::Config(
                "Target path must not be empty".to_string(),
            ));
        }

        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(CacheBumpError::Config(format!(
                        "Target path '{}' must not contain '..'",
                        path.display()
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(CacheBumpError::Config(format!(
                        "Target path '{}' must be relative to the project directory",
                        path.display()
                    )));
                }
            }
        }

        Ok(())
    }
}
