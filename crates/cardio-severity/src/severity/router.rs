use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use super::pipeline::{ModelInfo, SeverityPipeline};
use super::record::RawRecord;
use crate::error::AppError;

/// Router exposing prediction and model metadata over a shared, read-only pipeline.
pub fn severity_router(pipeline: Arc<SeverityPipeline>) -> Router {
    Router::new()
        .route("/api/predict", post(predict_handler))
        .route("/api/info", get(info_handler))
        .with_state(pipeline)
}

pub(crate) async fn predict_handler(
    State(pipeline): State<Arc<SeverityPipeline>>,
    payload: Result<Json<RawRecord>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(record) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "request body rejected");
        AppError::from(rejection)
    })?;
    let result = pipeline.predict(&record).map_err(|error| {
        warn!(kind = error.kind(), %error, "prediction rejected");
        AppError::from(error)
    })?;
    Ok(Json(json!({ "success": true, "data": result })))
}

pub(crate) async fn info_handler(
    State(pipeline): State<Arc<SeverityPipeline>>,
) -> Json<ModelInfo> {
    Json(pipeline.info())
}
