//! Series identity.

use std::fmt;

use streamprom_core::{LabelSet, Record};

/// Identity of one time series: the record name plus its label pairs.
///
/// The key is a canonical string built from the label pairs in sorted
/// order, JSON-encoded so that no name or value can be confused with a
/// separator. Value and timestamp never take part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey(String);

impl SeriesKey {
    pub fn new(name: &str, labels: &LabelSet) -> Self {
        // LabelSet iterates in key order, so the encoding is canonical.
        let pairs: Vec<[&str; 2]> = labels
            .iter()
            .map(|(k, v)| [k.as_str(), v.as_str()])
            .collect();
        let encoded = serde_json::json!([name, pairs]).to_string();
        SeriesKey(encoded)
    }

    pub fn from_record(record: &Record) -> Self {
        Self::new(&record.name, &record.labels)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
