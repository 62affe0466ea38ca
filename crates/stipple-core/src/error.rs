//! Error types for Stipple

use thiserror::Error;

/// The main error type for Stipple operations
#[derive(Debug, Error)]
pub enum StippleError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Render loop error: {0}")]
    LoopError(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Result type alias for Stipple operations
pub type Result<T> = std::result::Result<T, StippleError>;

impl From<toml::de::Error> for StippleError {
    fn from(err: toml::de::Error) -> Self {
        StippleError::TomlParseError(err.to_string())
    }
}
