use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheBumpError {
    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("File update failed: {0}")]
    FileUpdate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheBumpError>;
