pub mod config;
pub mod error;
pub mod types;

pub use config::{ExporterConfig, ExporterSettings, SourceSettings};
pub use error::{ConfigError, DecodeError};
pub use types::*;
