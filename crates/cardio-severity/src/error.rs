use crate::config::ConfigError;
use crate::severity::{ArtifactError, BatchError, PredictionError};
use crate::telemetry::TelemetryError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Artifact(ArtifactError),
    Prediction(PredictionError),
    Batch(BatchError),
    Serialization(serde_json::Error),
    Request(JsonRejection),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Artifact(err) => write!(f, "artifact error: {}", err),
            AppError::Prediction(err) => write!(f, "invalid input: {}", err),
            AppError::Batch(err) => write!(f, "batch error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
            AppError::Request(err) => write!(f, "invalid request body: {}", err.body_text()),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Artifact(err) => Some(err),
            AppError::Prediction(err) => Some(err),
            AppError::Batch(err) => Some(err),
            AppError::Serialization(err) => Some(err),
            AppError::Request(err) => Some(err),
        }
    }
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Prediction(err @ PredictionError::MissingRequiredField { .. }) => {
                (StatusCode::BAD_REQUEST, err.kind())
            }
            AppError::Prediction(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.kind()),
            AppError::Request(_) | AppError::Serialization(_) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            AppError::Artifact(_) => (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable"),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Batch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = match &self {
            AppError::Prediction(err) => err.to_string(),
            AppError::Request(err) => err.body_text(),
            _ => self.to_string(),
        };
        let fields = match &self {
            AppError::Prediction(err) => err.fields(),
            _ => Vec::new(),
        };

        let body = Json(json!({
            "success": false,
            "error": { "type": kind, "message": message, "fields": fields }
        }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ArtifactError> for AppError {
    fn from(value: ArtifactError) -> Self {
        Self::Artifact(value)
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        Self::Prediction(value)
    }
}

impl From<BatchError> for AppError {
    fn from(value: BatchError) -> Self {
        Self::Batch(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::Request(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::tests::common::read_json_body;

    #[tokio::test]
    async fn prediction_errors_use_client_statuses() {
        let missing = AppError::from(PredictionError::MissingRequiredField {
            fields: vec!["age", "sex"],
        })
        .into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        let body = read_json_body(missing).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["type"], "missing_required_field");
        assert_eq!(body["error"]["fields"], json!(["age", "sex"]));

        let invalid = AppError::from(PredictionError::InvalidCategory {
            field: "thal",
            value: "unknown".to_string(),
        })
        .into_response();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json_body(invalid).await;
        assert_eq!(body["error"]["type"], "invalid_category");
        assert_eq!(
            body["error"]["message"],
            "'unknown' is not a recognised value for thal"
        );
    }

    #[tokio::test]
    async fn server_side_errors_keep_the_envelope() {
        let response = AppError::from(ArtifactError::InconsistentTables(
            "grouping".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = read_json_body(response).await;
        assert_eq!(body["error"]["type"], "model_unavailable");
        assert_eq!(body["error"]["fields"], json!([]));

        let response =
            AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json_body(response).await;
        assert_eq!(body["error"]["type"], "server_error");
    }
}
