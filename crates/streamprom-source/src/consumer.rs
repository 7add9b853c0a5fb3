//! Consumer loop — pulls messages from a source into the engine.

use tokio::sync::watch;
use tracing::{debug, info};

use streamprom_metrics::MetricsEngine;

use crate::filter::TopicFilter;
use crate::message::MessageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    #[default]
    EndOfStream,
    Shutdown,
}

/// What a finished consumer run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumerReport {
    /// Messages handed to the engine (including ones it later rejected).
    pub delivered: u64,
    /// Messages dropped by the topic filter.
    pub filtered: u64,
    pub stop: StopReason,
}

/// Feed messages from `source` into `engine` until the stream ends or the
/// shutdown signal fires.
///
/// Bad records never stop the loop; only a source error does.
pub async fn run_consumer<S: MessageSource>(
    mut source: S,
    engine: &MetricsEngine,
    filter: &TopicFilter,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<ConsumerReport> {
    info!("stream consumer started");
    let mut report = ConsumerReport::default();

    loop {
        tokio::select! {
            next = source.next_message() => {
                let Some(message) = next? else {
                    report.stop = StopReason::EndOfStream;
                    break;
                };
                if filter.matches(&message.topic) {
                    engine.ingest(&message.topic, &message.payload);
                    report.delivered += 1;
                } else {
                    debug!(topic = %message.topic, "message filtered out");
                    report.filtered += 1;
                }
            }
            _ = shutdown.changed() => {
                report.stop = StopReason::Shutdown;
                break;
            }
        }
    }

    info!(
        delivered = report.delivered,
        filtered = report.filtered,
        stop = ?report.stop,
        "stream consumer stopped"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use regex::Regex;
    use streamprom_core::MetricType;

    use crate::channel::channel;
    use crate::line::LineSource;
    use crate::message::Message;

    #[tokio::test]
    async fn consumes_lines_into_engine() {
        let engine = MetricsEngine::new(MetricType::Counter, Duration::ZERO);
        let input: &[u8] = b"test.hoge\t{\"name\":\"foo\",\"value\":9}\n\
                             test.hoge\t{\"name\":\"foo\"}\n\
                             test.hoge\t{\"name\":\"foo\",\"value\":1}\n";
        let (_tx, rx) = watch::channel(false);

        let report = run_consumer(LineSource::new(input, "d"), &engine, &TopicFilter::all(), rx)
            .await
            .unwrap();

        assert_eq!(report.delivered, 3);
        assert_eq!(report.stop, StopReason::EndOfStream);

        let families = engine.snapshot();
        assert_eq!(families[0].name, "test_hoge_foo");
        assert_eq!(families[0].samples[0].value, 10.0);
        assert_eq!(engine.stats().rejected, 1);
    }

    #[tokio::test]
    async fn non_utf8_record_is_rejected_and_ingestion_continues() {
        let engine = MetricsEngine::new(MetricType::Gauge, Duration::ZERO);
        let input: &[u8] = b"t\t{\"name\":\"a\",\"value\":1}\n\
                             t\t{\"name\":\"\xff\",\"value\":1}\n\
                             t\t{\"name\":\"b\",\"value\":1}\n";
        let (_tx, rx) = watch::channel(false);

        let report = run_consumer(LineSource::new(input, "d"), &engine, &TopicFilter::all(), rx)
            .await
            .unwrap();

        assert_eq!(report.delivered, 3);
        assert_eq!(report.stop, StopReason::EndOfStream);
        let names: Vec<_> = engine.snapshot().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["t_a", "t_b"]);
        assert_eq!(engine.stats().failed, 1);
    }

    #[tokio::test]
    async fn filter_skips_unsubscribed_topics() {
        let engine = MetricsEngine::new(MetricType::Gauge, Duration::ZERO);
        let (tx, source) = channel();
        tx.send(Message::new("metrics.a", r#"{"name":"x","value":1}"#)).unwrap();
        tx.send(Message::new("logs.a", r#"{"name":"x","value":1}"#)).unwrap();
        drop(tx);

        let filter = TopicFilter::new(Regex::new(r"^metrics\.").unwrap());
        let (_stop_tx, stop_rx) = watch::channel(false);
        let report = run_consumer(source, &engine, &filter, stop_rx).await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.filtered, 1);
        let names: Vec<_> = engine.snapshot().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["metrics_a_x"]);
    }

    #[tokio::test]
    async fn shutdown_stops_idle_consumer() {
        let engine = Arc::new(MetricsEngine::new(MetricType::Gauge, Duration::ZERO));
        let (msg_tx, source) = channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = {
            let engine = engine.clone();
            tokio::spawn(async move {
                run_consumer(source, &engine, &TopicFilter::all(), stop_rx).await
            })
        };

        msg_tx.send(Message::new("t", r#"{"name":"x","value":5}"#)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("consumer should stop")
            .unwrap()
            .unwrap();
        assert_eq!(report.stop, StopReason::Shutdown);
        assert_eq!(report.delivered, 1);
        assert_eq!(engine.snapshot()[0].samples[0].value, 5.0);
    }
}
