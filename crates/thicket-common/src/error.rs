//! Error types for Thicket.

use thiserror::Error;

/// Top-level error type for Thicket operations.
#[derive(Debug, Error)]
pub enum ThicketError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Content/data errors
    #[error("Content error: {0}")]
    Content(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse a configuration document
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        /// Format name (toml, ron)
        format: &'static str,
        /// Parser message
        message: String,
    },

    /// A value is outside its allowed range
    #[error("Config value `{field}` out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Result type alias for Thicket operations.
pub type ThicketResult<T> = Result<T, ThicketError>;
