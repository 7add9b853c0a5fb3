//! streamprom-metrics — the aggregation engine behind the exporter.
//!
//! Turns a stream of discrete metric records into a coherent, scrapeable
//! snapshot of metric families.
//!
//! # Architecture
//!
//! ```text
//! MetricsEngine
//!   ├── ingest()       ← called per stream message (decode → name → combine)
//!   ├── snapshot()     → evicts expired series, returns live families
//!   └── run_sweeper()  → optional periodic eviction loop
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod collector;
pub mod error;
pub mod identity;
pub mod naming;
pub mod prometheus;
pub mod sample;

pub use collector::{IngestStats, MetricsEngine};
pub use error::IngestError;
pub use identity::SeriesKey;
pub use naming::derive_family_name;
pub use prometheus::render_prometheus;
pub use sample::{MetricFamilySnapshot, Sample, Series, to_sample};
