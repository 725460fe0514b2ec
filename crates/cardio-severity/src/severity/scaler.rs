use serde::{Deserialize, Serialize};

use super::error::ArtifactError;

/// Persisted standardisation parameters, one entry per feature in layout order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Scaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler {
    /// Validates the parameters against the feature layout the bundle declares.
    pub fn new(artifact: ScalerArtifact, feature_names: &[String]) -> Result<Self, ArtifactError> {
        for (component, found) in [
            ("scaler mean", artifact.mean.len()),
            ("scaler scale", artifact.scale.len()),
        ] {
            if found != feature_names.len() {
                return Err(ArtifactError::DimensionMismatch {
                    component,
                    expected: feature_names.len(),
                    found,
                });
            }
        }

        for ((name, mean), scale) in feature_names.iter().zip(&artifact.mean).zip(&artifact.scale) {
            if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                return Err(ArtifactError::ZeroVariance {
                    feature: name.clone(),
                });
            }
        }

        Ok(Self {
            mean: artifact.mean,
            scale: artifact.scale,
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn scale(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }
}
