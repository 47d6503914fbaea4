use thiserror::Error;

/// Crate-wide error type to avoid `Box<dyn Error>` in public APIs.
#[derive(Error, Debug)]
pub enum PdfebcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::errors::ConfigError),

    #[error("Email error: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ghostscript not installed or not aliased to '{0}'")]
    ToolNotFound(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
