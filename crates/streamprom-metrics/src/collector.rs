//! Metrics engine — aggregates stream records into metric families.
//!
//! State is a two-level concurrent map: family name → (series key → series).
//! Both levels are sharded `DashMap`s, so a read-modify-write on one series
//! runs under that series' shard lock while unrelated series and families
//! proceed in parallel. Locks are always taken outer-then-inner.
//!
//! Expired series are evicted lazily when a snapshot is taken, or by the
//! optional background sweeper.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use streamprom_core::{ConfigError, ExporterSettings, MetricType, Record};

use crate::error::IngestError;
use crate::identity::SeriesKey;
use crate::naming::derive_family_name;
use crate::sample::{MetricFamilySnapshot, Series, to_sample};

type Family = DashMap<SeriesKey, Series>;

#[derive(Default)]
struct Counters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    evicted: AtomicU64,
}

/// Point-in-time copy of the engine's ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Records combined into a series.
    pub accepted: u64,
    /// Records dropped for not matching the record shape.
    pub rejected: u64,
    /// Records dropped for any other reason.
    pub failed: u64,
    /// Series removed after their TTL elapsed.
    pub evicted: u64,
}

/// Aggregates records into metric families and serves snapshots of them.
///
/// `Send + Sync`; share it behind an `Arc` between consumers and scrapers.
pub struct MetricsEngine {
    families: DashMap<String, Family>,
    metric_type: MetricType,
    /// `None` disables expiry.
    ttl: Option<Duration>,
    counters: Counters,
}

impl MetricsEngine {
    /// Create an engine. A zero `ttl` disables expiry.
    pub fn new(metric_type: MetricType, ttl: Duration) -> Self {
        Self {
            families: DashMap::new(),
            metric_type,
            ttl: (!ttl.is_zero()).then_some(ttl),
            counters: Counters::default(),
        }
    }

    /// Create an engine from exporter settings, failing on an invalid metric type.
    pub fn from_config(settings: &ExporterSettings) -> Result<Self, ConfigError> {
        let metric_type = settings.metric_type()?;
        let ttl = Duration::from_secs(settings.metric_expire_seconds);
        info!(%metric_type, ttl_secs = ttl.as_secs(), "metrics engine configured");
        Ok(Self::new(metric_type, ttl))
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Ingest one raw record received on `topic`, stamped with the current time.
    pub fn ingest(&self, topic: &str, payload: &[u8]) {
        self.ingest_at(topic, payload, SystemTime::now());
    }

    /// Ingest one raw record, stamped with `now`.
    ///
    /// A record that cannot be ingested is logged, counted, and dropped; it
    /// never affects other records.
    pub fn ingest_at(&self, topic: &str, payload: &[u8], now: SystemTime) {
        match self.try_ingest_at(topic, payload, now) {
            Ok(()) => {}
            Err(e) if e.is_data_quality() => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    %topic,
                    payload = %String::from_utf8_lossy(payload),
                    error = %e,
                    "invalid record"
                );
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(%topic, error = %e, "failed to add record");
            }
        }
    }

    /// Like [`ingest_at`](Self::ingest_at), but hands the failure back
    /// instead of logging it. Counters only track successes here.
    pub fn try_ingest_at(
        &self,
        topic: &str,
        payload: &[u8],
        now: SystemTime,
    ) -> Result<(), IngestError> {
        let record = Record::decode(payload)?;
        let family_name = derive_family_name(topic, &record.name);
        if family_name.is_empty() {
            return Err(IngestError::EmptyFamilyName {
                topic: topic.to_string(),
            });
        }
        let key = SeriesKey::from_record(&record);

        // Hold the family under a shared guard so it cannot be removed
        // mid-update; a concurrent eviction waits for us.
        let family = match self.families.get(&family_name) {
            Some(family) => family,
            None => self
                .families
                .entry(family_name.clone())
                .or_default()
                .downgrade(),
        };
        self.combine(&family, key, record, now);
        drop(family);

        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
        debug!(family = %family_name, "record added");
        Ok(())
    }

    /// Apply the engine's combination policy to one series.
    fn combine(&self, family: &Family, key: SeriesKey, record: Record, now: SystemTime) {
        match family.entry(key) {
            Entry::Occupied(mut slot) => {
                let series = slot.get_mut();
                match self.metric_type {
                    MetricType::Counter => series.value += record.value,
                    MetricType::Gauge => series.value = record.value,
                }
                series.timestamp_ms = record.timestamp;
                series.last_seen = now;
            }
            Entry::Vacant(slot) => {
                slot.insert(Series::new(record, now));
            }
        }
    }

    /// Snapshot all live families as of the current time.
    ///
    /// This is not a pure read: expired series are evicted and emptied
    /// families removed. Without scrapes (or the sweeper), expired data
    /// stays in memory.
    pub fn snapshot(&self) -> Vec<MetricFamilySnapshot> {
        self.snapshot_at(SystemTime::now())
    }

    /// Snapshot all live families as of `now`, evicting expired series.
    ///
    /// Families come back sorted by name and samples by series key, so two
    /// scrapes of unchanged state compare equal.
    pub fn snapshot_at(&self, now: SystemTime) -> Vec<MetricFamilySnapshot> {
        let mut snapshots = Vec::new();

        for name in self.family_names() {
            let samples = match self.families.get(&name) {
                Some(family) => {
                    self.evict_from(&family, now);
                    let mut keyed: Vec<_> = family
                        .iter()
                        .map(|e| (e.key().clone(), to_sample(&name, e.value())))
                        .collect();
                    keyed.sort_by(|a, b| a.0.cmp(&b.0));
                    keyed.into_iter().map(|(_, sample)| sample).collect::<Vec<_>>()
                }
                None => continue,
            };

            if samples.is_empty() {
                self.remove_if_empty(&name);
                continue;
            }

            snapshots.push(MetricFamilySnapshot {
                name,
                metric_type: self.metric_type,
                help: String::new(),
                samples,
            });
        }

        debug!(families = snapshots.len(), "snapshot materialized");
        snapshots
    }

    /// Evict expired series without materializing a snapshot.
    ///
    /// Returns the number of series removed.
    pub fn evict_expired(&self, now: SystemTime) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut evicted = 0;
        for name in self.family_names() {
            let empty = match self.families.get(&name) {
                Some(family) => {
                    evicted += self.evict_from(&family, now);
                    family.is_empty()
                }
                None => continue,
            };
            if empty {
                self.remove_if_empty(&name);
            }
        }
        evicted
    }

    /// Run periodic eviction until the shutdown signal fires.
    ///
    /// Returns immediately when expiry is disabled.
    pub async fn run_sweeper(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        if self.ttl.is_none() {
            info!("metric expiry disabled, sweeper not started");
            return;
        }

        info!(interval_secs = interval.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let evicted = self.evict_expired(SystemTime::now());
                    if evicted > 0 {
                        debug!(evicted, "expired series swept");
                    }
                }
                _ = shutdown.changed() => {
                    info!("expiry sweeper shutting down");
                    break;
                }
            }
        }
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            evicted: self.counters.evicted.load(Ordering::Relaxed),
        }
    }

    /// Number of families currently held, including any not yet evicted.
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Number of series currently held across all families.
    pub fn series_count(&self) -> usize {
        self.families.iter().map(|family| family.len()).sum()
    }

    fn family_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    fn evict_from(&self, family: &Family, now: SystemTime) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };

        let mut evicted = 0;
        family.retain(|_, series| {
            let keep = !is_expired(series, ttl, now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            self.counters
                .evicted
                .fetch_add(evicted as u64, Ordering::Relaxed);
        }
        evicted
    }

    /// Drop a family only if it is still empty once we hold its shard
    /// exclusively; an ingest that got there first keeps it alive.
    fn remove_if_empty(&self, name: &str) {
        if self
            .families
            .remove_if(name, |_, family| family.is_empty())
            .is_some()
        {
            debug!(family = %name, "empty family removed");
        }
    }
}

fn is_expired(series: &Series, ttl: Duration, now: SystemTime) -> bool {
    match series.last_seen.checked_add(ttl) {
        Some(deadline) => deadline < now,
        None => false,
    }
}
