use std::path::PathBuf;

/// Client-input failures. Raised before the scaler runs; no partial prediction is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("missing required fields: {}", fields.join(", "))]
    MissingRequiredField { fields: Vec<&'static str> },
    #[error("'{value}' is not a recognised value for {field}")]
    InvalidCategory { field: &'static str, value: String },
    #[error("{field} must lie between {min} and {max} (found {value})")]
    OutOfRangeValue {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be numeric (found '{value}')")]
    InvalidNumber { field: &'static str, value: String },
}

impl PredictionError {
    /// Field names involved in the failure, for structured error payloads.
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            PredictionError::MissingRequiredField { fields } => fields.clone(),
            PredictionError::InvalidCategory { field, .. }
            | PredictionError::OutOfRangeValue { field, .. }
            | PredictionError::InvalidNumber { field, .. } => vec![*field],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::MissingRequiredField { .. } => "missing_required_field",
            PredictionError::InvalidCategory { .. } => "invalid_category",
            PredictionError::OutOfRangeValue { .. } => "out_of_range_value",
            PredictionError::InvalidNumber { .. } => "invalid_number",
        }
    }
}

/// Startup failures: the bundle is absent, unreadable or internally inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("model artifact bundle not loaded from {path}: {source}")]
    NotLoaded {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact bundle is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("scaler has zero or non-finite scale for feature '{feature}'")]
    ZeroVariance { feature: String },
    #[error("{component} expects {expected} values, bundle provides {found}")]
    DimensionMismatch {
        component: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("feature order mismatch at position {position}: expected '{expected}', found '{found}'")]
    FeatureOrderMismatch {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("severity tables disagree: {0}")]
    InconsistentTables(String),
    #[error("invalid vocabulary for {field}: {reason}")]
    Vocabulary { field: &'static str, reason: String },
    #[error("invalid imputer configuration: {0}")]
    Imputer(String),
    #[error("invalid model '{name}': {reason}")]
    Model { name: &'static str, reason: String },
    #[error("{name} must lie in {range} (found {value})")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        range: &'static str,
    },
}
