//! Error types for the license audit

use thiserror::Error;

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Main error type for audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to parse lockfile: {0}")]
    LockfileError(String),

    #[error("Failed to fetch {package}: {message}")]
    FetchError { package: String, message: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Report rendering error: {0}")]
    ReportError(String),
}

impl AuditError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a lockfile error
    pub fn lockfile(msg: impl Into<String>) -> Self {
        Self::LockfileError(msg.into())
    }

    /// Create a fetch error for a package
    pub fn fetch(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchError {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report(msg: impl Into<String>) -> Self {
        Self::ReportError(msg.into())
    }
}
