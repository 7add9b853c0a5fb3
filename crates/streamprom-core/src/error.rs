//! Error types shared across streamprom crates.

use thiserror::Error;

/// Errors raised while loading or validating exporter configuration.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid metric type {0:?}: must be either \"gauge\" or \"counter\"")]
    InvalidMetricType(String),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid topic pattern: {0}")]
    TopicPattern(#[from] regex::Error),
}

/// A payload that could not be turned into a [`Record`](crate::Record).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Valid JSON, but not a record: missing `name`/`value`, wrong field types.
    #[error("record shape mismatch: {0}")]
    Shape(#[source] serde_json::Error),

    /// Not JSON at all (syntax error, truncated input, bad encoding).
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Data => DecodeError::Shape(e),
            _ => DecodeError::Malformed(e),
        }
    }
}
