//! Snapshot output types and sample materialization.

use std::time::SystemTime;

use serde::Serialize;
use streamprom_core::{LabelSet, MetricType, Record};

/// Stored state for one series identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: LabelSet,
    pub value: f64,
    /// Timestamp of the most recent record, as supplied by the producer.
    pub timestamp_ms: Option<i64>,
    /// Wall-clock time of the last ingest touching this series.
    pub last_seen: SystemTime,
}

impl Series {
    pub fn new(record: Record, now: SystemTime) -> Self {
        Self {
            labels: record.labels,
            value: record.value,
            timestamp_ms: record.timestamp,
            last_seen: now,
        }
    }
}

/// One exposed sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub name: String,
    pub label_names: Vec<String>,
    pub label_values: Vec<String>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

impl Sample {
    /// Iterate `(name, value)` label pairs.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_names
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }
}

/// All live samples of one metric family at scrape time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFamilySnapshot {
    pub name: String,
    pub metric_type: MetricType,
    /// Always empty; records carry no help text.
    pub help: String,
    pub samples: Vec<Sample>,
}

/// Materialize a stored series into an output sample.
///
/// Labels come out sorted by label name.
pub fn to_sample(family_name: &str, series: &Series) -> Sample {
    let (label_names, label_values): (Vec<String>, Vec<String>) = series
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .unzip();

    Sample {
        name: family_name.to_string(),
        label_names,
        label_values,
        value: series.value,
        timestamp_ms: series.timestamp_ms,
    }
}
