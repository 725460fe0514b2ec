use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use cardio_severity::severity::{severity_router, SeverityPipeline};
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_service_routes(pipeline: Arc<SeverityPipeline>) -> axum::Router {
    severity_router(pipeline)
        .route("/", get(index))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/health", get(model_health))
}

/// Service identity and the endpoints it exposes.
pub(crate) async fn index(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    let metadata = state.pipeline.metadata();
    Json(json!({
        "name": "Heart Disease Severity API",
        "version": env!("CARGO_PKG_VERSION"),
        "model": metadata.model_name,
        "model_version": metadata.version,
        "f1_score": metadata.performance.test_f1_weighted,
        "endpoints": {
            "POST /api/predict": "Severity prediction (3 levels)",
            "GET /api/info": "Model information",
            "GET /api/health": "Model health",
            "GET /health": "Liveness",
            "GET /ready": "Readiness",
            "GET /metrics": "Prometheus metrics",
        },
    }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Liveness plus the identity of the bundle being served.
pub(crate) async fn model_health(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    let metadata = state.pipeline.metadata();
    Json(json!({
        "status": "healthy",
        "model_loaded": true,
        "model_name": metadata.model_name,
        "model_version": metadata.version,
        "strategy": state.pipeline.strategy_name(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
