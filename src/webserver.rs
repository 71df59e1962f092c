use axum::extract::State;
use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use blobcache::metrics::{CounterMetrics, MetricsSnapshot};
use blobcache::{DigestCache, Provider};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub provider: Provider,
    pub metrics: Arc<CounterMetrics>,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    #[serde(flatten)]
    pub requests: MetricsSnapshot,
    pub entries: usize,
    pub enabled: bool,
}

impl CacheStatus {
    fn collect(cache: &DigestCache, metrics: &CounterMetrics) -> Self {
        Self {
            requests: metrics.snapshot(),
            entries: cache.len(),
            enabled: cache.is_enabled(),
        }
    }
}

pub async fn readiness_probe() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn liveness_probe() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn digest_cache_status(State(state): State<AppState>) -> Json<CacheStatus> {
    Json(CacheStatus::collect(state.provider.cache(), &state.metrics))
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics/digest-cache", get(digest_cache_status))
        .with_state(state)
}
