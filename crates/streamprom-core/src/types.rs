//! Shared types used across streamprom crates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, DecodeError};

/// Label name → label value. Ordered so that iteration is canonical.
pub type LabelSet = BTreeMap<String, String>;

/// How records sharing an identity combine. Fixed for a whole engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Last write wins.
    Gauge,
    /// Incoming values are summed into the stored value.
    Counter,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricType::Gauge),
            "counter" => Ok(MetricType::Counter),
            other => Err(ConfigError::InvalidMetricType(other.to_string())),
        }
    }
}

/// One decoded metric event from the stream.
///
/// Wire shape:
///
/// ```text
/// { "name": "foo", "labels": { "k": "v" }, "value": 9, "timestamp": 1517330227 }
/// ```
///
/// `labels` and `timestamp` are optional; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(default, deserialize_with = "nullable_labels")]
    pub labels: LabelSet,
    pub value: f64,
    /// Epoch millis supplied by the producer. Exposed, never used for aging.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Record {
    /// Decode a record from a raw message payload.
    ///
    /// The payload must be a JSON object; any other JSON value is a shape
    /// mismatch.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_slice(payload)?;
        if !value.is_object() {
            return Err(DecodeError::Shape(de::Error::invalid_type(
                unexpected(&value),
                &"a JSON object",
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn unexpected(value: &serde_json::Value) -> Unexpected<'_> {
    use serde_json::Value;
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

// `"labels": null` is treated like an absent field.
fn nullable_labels<'de, D>(deserializer: D) -> Result<LabelSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LabelSet>::deserialize(deserializer)?.unwrap_or_default())
}
