//! Heart disease severity inference: encoding, imputation, feature engineering, scaling,
//! classification and response composition over a read-only model artifact bundle.

pub mod artifacts;
pub mod batch;
pub mod classifier;
pub mod encoder;
pub mod error;
pub mod features;
pub mod imputer;
pub mod label;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod response;
pub mod router;
pub mod scaler;

#[cfg(test)]
pub(crate) mod tests;

pub use artifacts::{BundleMetadata, ModelArtifactBundle, PerformanceMetrics};
pub use batch::{BatchError, BatchReport, BatchRow, BatchScorer, RowOutcome};
pub use classifier::{ClassProbabilities, ClassifierArtifact, SeverityClassifier};
pub use error::{ArtifactError, PredictionError};
pub use label::{group_severity, SeverityLabel, SeverityPresentation, SEVERITY_GROUPING};
pub use pipeline::{EncodedFeatureVector, ModelInfo, SeverityPipeline};
pub use record::{ClinicalField, ClinicalRecord, RawRecord, RawValue};
pub use response::{PredictionResult, DEFAULT_LOW_CONFIDENCE_THRESHOLD, LOW_CONFIDENCE_ACTION};
pub use router::severity_router;
