//! Exporter configuration (`streamprom.toml`).

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::MetricType;

pub const DEFAULT_PORT: u16 = 7979;
pub const DEFAULT_TOPIC: &str = "metrics";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    pub exporter: ExporterSettings,
    #[serde(default)]
    pub source: SourceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    /// `"gauge"` or `"counter"`. Kept as a string so that a bad value is
    /// reported by [`ExporterSettings::metric_type`] rather than as a TOML error.
    pub metric_type: String,
    /// Seconds since last update before a series is evicted. 0 disables.
    #[serde(default)]
    pub metric_expire_seconds: u64,
    /// Background eviction interval. 0 means evict only on scrape.
    #[serde(default)]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Only messages whose topic matches are ingested.
    pub topic_pattern: Option<String>,
    /// Topic for input lines that carry no topic prefix.
    #[serde(default = "default_topic")]
    pub default_topic: String,
    /// `-` for stdin, otherwise a file path.
    pub input: Option<PathBuf>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            topic_pattern: None,
            default_topic: default_topic(),
            input: None,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

impl ExporterSettings {
    pub fn metric_type(&self) -> Result<MetricType, ConfigError> {
        self.metric_type.parse()
    }
}

impl SourceSettings {
    pub fn topic_regex(&self) -> Result<Option<Regex>, ConfigError> {
        self.topic_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(ConfigError::from)
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check everything that would otherwise fail later at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exporter.metric_type()?;
        self.source.topic_regex()?;
        Ok(())
    }

    /// Scaffold a minimal config for the given metric type.
    pub fn scaffold(metric_type: MetricType) -> Self {
        ExporterConfig {
            exporter: ExporterSettings {
                port: DEFAULT_PORT,
                metric_type: metric_type.as_str().to_string(),
                metric_expire_seconds: 0,
                sweep_interval_seconds: 0,
            },
            source: SourceSettings {
                input: Some(PathBuf::from("-")),
                ..SourceSettings::default()
            },
        }
    }
}
