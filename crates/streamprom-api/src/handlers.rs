//! HTTP handlers.
//!
//! Snapshot-producing handlers go through `MetricsEngine::snapshot`, so every
//! scrape also evicts expired series.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::debug;

use streamprom_metrics::IngestStats;
use streamprom_metrics::prometheus::CONTENT_TYPE;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    data: T,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(serde::Serialize)]
struct StatsBody {
    metric_type: &'static str,
    #[serde(flatten)]
    ingest: IngestStats,
    families: usize,
    series: usize,
}

// ── Exposition ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let families = state.engine.snapshot();
    debug!(families = families.len(), "scrape served");
    let body = streamprom_metrics::render_prometheus(&families);
    (StatusCode::OK, [("content-type", CONTENT_TYPE)], body)
}

// ── Introspection ──────────────────────────────────────────────

/// GET /api/v1/families
pub async fn list_families(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.engine.snapshot())
}

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<ApiState>) -> impl IntoResponse {
    let engine = &state.engine;
    ApiResponse::ok(StatsBody {
        metric_type: engine.metric_type().as_str(),
        ingest: engine.stats(),
        families: engine.family_count(),
        series: engine.series_count(),
    })
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
