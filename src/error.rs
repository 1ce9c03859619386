//! Error types for fortfold

use thiserror::Error;

/// Result type alias for fortfold operations
pub type Result<T> = std::result::Result<T, FortfoldError>;

/// Errors from configuration loading and the command line.
/// Styling and folding themselves never fail.
#[derive(Error, Debug)]
pub enum FortfoldError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidSetting { key: String, value: String },

    #[error("Unknown source format: {0}")]
    UnknownFormat(String),

    #[error("{0}")]
    Usage(String),
}
