//! streamprom-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/api/v1/families` | Current snapshot as JSON |
//! | GET | `/api/v1/stats` | Ingest counters |
//! | GET | `/healthz` | Liveness |
//!
//! Both snapshot routes evict expired series as a side effect.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use streamprom_metrics::MetricsEngine;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<MetricsEngine>,
}

/// Build the complete router.
pub fn build_router(engine: Arc<MetricsEngine>) -> Router {
    let state = ApiState { engine };

    let api_routes = Router::new()
        .route("/families", get(handlers::list_families))
        .route("/stats", get(handlers::get_stats))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
        .route("/healthz", get(handlers::healthz))
}
