use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::classifier::ClassifierArtifact;
use super::encoder::Vocabulary;
use super::error::ArtifactError;
use super::features::EngineeringArtifact;
use super::imputer::ImputerArtifact;
use super::label::SeverityPresentation;
use super::response::DEFAULT_LOW_CONFIDENCE_THRESHOLD;
use super::scaler::ScalerArtifact;

/// Held-out metrics recorded when the bundle was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub test_f1_weighted: f64,
    pub test_accuracy: f64,
    #[serde(default)]
    pub f1_per_class: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub model_name: String,
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    /// Column order the scaler and classifier were fitted on.
    pub feature_order: Vec<String>,
    /// Reporting class names by class index.
    pub class_mapping: Vec<String>,
    /// Original 0..=4 severity level to reporting class.
    pub severity_grouping: Vec<u8>,
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f64,
    #[serde(default)]
    pub performance: PerformanceMetrics,
}

fn default_low_confidence_threshold() -> f64 {
    DEFAULT_LOW_CONFIDENCE_THRESHOLD
}

/// Everything inference needs, versioned together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifactBundle {
    pub metadata: BundleMetadata,
    pub encoders: Vec<Vocabulary>,
    pub imputer: ImputerArtifact,
    #[serde(default)]
    pub engineering: EngineeringArtifact,
    pub scaler: ScalerArtifact,
    pub classifier: ClassifierArtifact,
    #[serde(default = "SeverityPresentation::standard")]
    pub presentation: Vec<SeverityPresentation>,
}

impl ModelArtifactBundle {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArtifactError::NotLoaded {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(raw)?)
    }
}
