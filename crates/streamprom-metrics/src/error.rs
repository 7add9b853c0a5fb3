//! Per-record ingest failures.

use streamprom_core::DecodeError;
use thiserror::Error;

/// Why a single record was dropped. Never fatal to the stream.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("record on topic {topic:?} has no usable family name")]
    EmptyFamilyName { topic: String },
}

impl IngestError {
    /// Shape mismatches are data-quality problems; everything else is unexpected.
    pub fn is_data_quality(&self) -> bool {
        matches!(self, IngestError::Decode(DecodeError::Shape(_)))
    }
}
