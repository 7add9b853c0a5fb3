//! Standalone regression tests.
//!
//! Wires a source, the engine, and the router together the way the daemon
//! does, then scrapes over HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use streamprom_api::build_router;
use streamprom_core::{ExporterConfig, MetricType};
use streamprom_metrics::MetricsEngine;
use streamprom_source::{LineSource, Message, StopReason, TopicFilter, channel, run_consumer};

fn engine(metric_type: MetricType) -> Arc<MetricsEngine> {
    Arc::new(MetricsEngine::new(metric_type, Duration::ZERO))
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn standalone_metrics_endpoint_empty() {
    let router = build_router(engine(MetricType::Counter));

    let (status, body) = get(router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn standalone_healthz() {
    let router = build_router(engine(MetricType::Gauge));

    let (status, body) = get(router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn standalone_counter_end_to_end() {
    let config = ExporterConfig::from_toml_str(
        r#"
[exporter]
metric_type = "counter"

[source]
default_topic = "test.hoge"
"#,
    )
    .unwrap();
    let engine = Arc::new(MetricsEngine::from_config(&config.exporter).unwrap());
    let filter = TopicFilter::from_settings(&config.source).unwrap();

    let input: &[u8] = b"{\"name\":\"foo\",\"value\":9}\n\
                         {\"name\":\"foo\",\"labels\":{\"a\":\"1\"},\"value\":2}\n\
                         {\"name\":\"foo\",\"labels\":{\"a\":\"1\"},\"value\":3}\n\
                         {\"name\":\"broken\"}\n";
    let (_tx, rx) = watch::channel(false);
    let report = run_consumer(
        LineSource::new(input, config.source.default_topic.clone()),
        &engine,
        &filter,
        rx,
    )
    .await
    .unwrap();
    assert_eq!(report.stop, StopReason::EndOfStream);

    let router = build_router(engine);
    let (status, body) = get(router.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "# HELP test_hoge_foo \n\
         # TYPE test_hoge_foo counter\n\
         test_hoge_foo{a=\"1\"} 5\n\
         test_hoge_foo 9\n"
    );

    let (status, body) = get(router, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["data"]["accepted"], 3);
    assert_eq!(stats["data"]["rejected"], 1);
}

#[tokio::test]
async fn standalone_gauge_from_channel_source() {
    let engine = engine(MetricType::Gauge);
    let (tx, source) = channel();
    let (_stop_tx, stop_rx) = watch::channel(false);

    let consumer = {
        let engine = engine.clone();
        tokio::spawn(async move { run_consumer(source, &engine, &TopicFilter::all(), stop_rx).await })
    };

    tx.send(Message::new("app.web", r#"{"name":"temp","value":20}"#)).unwrap();
    tx.send(Message::new("app.web", r#"{"name":"temp","value":23.5,"timestamp":1000}"#)).unwrap();
    drop(tx);
    consumer.await.unwrap().unwrap();

    let (_, body) = get(build_router(engine), "/api/v1/families").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let family = &json["data"][0];
    assert_eq!(family["name"], "app_web_temp");
    assert_eq!(family["metric_type"], "gauge");
    assert_eq!(family["help"], "");
    assert_eq!(family["samples"][0]["value"], 23.5);
    assert_eq!(family["samples"][0]["timestamp_ms"], 1000);
}

#[tokio::test]
async fn standalone_scrape_evicts_expired_series() {
    let engine = Arc::new(MetricsEngine::new(MetricType::Gauge, Duration::from_secs(120)));
    engine.ingest_at("t", br#"{"name":"old","value":1}"#, std::time::UNIX_EPOCH);
    engine.ingest("t", br#"{"name":"fresh","value":1}"#);
    assert_eq!(engine.family_count(), 2);

    let (_, body) = get(build_router(engine.clone()), "/metrics").await;
    assert!(body.contains("t_fresh 1"));
    assert!(!body.contains("t_old"));
    assert_eq!(engine.family_count(), 1);
    assert_eq!(engine.stats().evicted, 1);
}
