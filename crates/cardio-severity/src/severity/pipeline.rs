use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::artifacts::{BundleMetadata, ModelArtifactBundle, PerformanceMetrics};
use super::classifier::{ClassProbabilities, SeverityClassifier};
use super::encoder::FeatureEncoder;
use super::error::{ArtifactError, PredictionError};
use super::features::{feature_names, FeatureEngineer};
use super::imputer::MissingValueResolver;
use super::label::{verify_grouping, CLASS_COUNT};
use super::record::{ClinicalField, ClinicalRecord, RawRecord};
use super::response::{PredictionResult, ResponseComposer};
use super::scaler::Scaler;

/// Unscaled model input plus the optional fields that were imputed.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureVector {
    values: Vec<f64>,
    imputed: Vec<ClinicalField>,
}

impl EncodedFeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn imputed(&self) -> &[ClinicalField] {
        &self.imputed
    }

    pub fn is_imputed(&self, field: ClinicalField) -> bool {
        self.imputed.contains(&field)
    }
}

/// Serializable summary of the loaded bundle.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub version: String,
    pub strategy: &'static str,
    pub num_classes: usize,
    pub class_mapping: BTreeMap<String, String>,
    pub performance: PerformanceMetrics,
    pub features: usize,
    pub feature_order: Vec<String>,
    pub low_confidence_threshold: f64,
    pub description: String,
}

/// End-to-end inference over a loaded bundle. Immutable after construction.
#[derive(Debug, Clone)]
pub struct SeverityPipeline {
    metadata: BundleMetadata,
    encoder: FeatureEncoder,
    resolver: MissingValueResolver,
    engineer: FeatureEngineer,
    indicators: Vec<ClinicalField>,
    scaler: Scaler,
    classifier: SeverityClassifier,
    composer: ResponseComposer,
}

impl SeverityPipeline {
    /// Validates every artifact against the others; any inconsistency refuses to build.
    pub fn from_bundle(bundle: ModelArtifactBundle) -> Result<Self, ArtifactError> {
        let ModelArtifactBundle {
            metadata,
            encoders,
            imputer,
            engineering,
            scaler,
            classifier,
            presentation,
        } = bundle;

        verify_grouping(&metadata.severity_grouping, &metadata.class_mapping)?;

        let encoder = FeatureEncoder::new(encoders)?;
        let resolver = MissingValueResolver::new(imputer)?;
        let engineer = FeatureEngineer::new(engineering)?;
        let indicators = resolver.indicator_fields();

        let names = feature_names(&indicators);
        if metadata.feature_order.len() != names.len() {
            return Err(ArtifactError::DimensionMismatch {
                component: "feature order",
                expected: names.len(),
                found: metadata.feature_order.len(),
            });
        }
        if let Some((position, (expected, found))) = names
            .iter()
            .zip(&metadata.feature_order)
            .enumerate()
            .find(|(_, (expected, found))| expected != found)
        {
            return Err(ArtifactError::FeatureOrderMismatch {
                position,
                expected: expected.clone(),
                found: found.clone(),
            });
        }

        let scaler = Scaler::new(scaler, &names)?;
        let classifier = SeverityClassifier::new(classifier, names.len())?;
        let composer = ResponseComposer::new(presentation, metadata.low_confidence_threshold)?;

        info!(
            model = %metadata.model_name,
            version = %metadata.version,
            strategy = classifier.strategy_name(),
            features = names.len(),
            "severity model bundle loaded"
        );

        Ok(Self {
            metadata,
            encoder,
            resolver,
            engineer,
            indicators,
            scaler,
            classifier,
            composer,
        })
    }

    /// Replace the bundle's low-confidence threshold (configuration override).
    pub fn with_low_confidence_threshold(mut self, threshold: f64) -> Result<Self, ArtifactError> {
        self.composer.set_low_confidence_threshold(threshold)?;
        Ok(self)
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    pub fn strategy_name(&self) -> &'static str {
        self.classifier.strategy_name()
    }

    /// Validate, encode, impute and engineer; every client-input error surfaces here.
    pub fn prepare(&self, raw: &RawRecord) -> Result<EncodedFeatureVector, PredictionError> {
        let record = ClinicalRecord::from_raw(raw)?;
        let partial = self.encoder.encode(&record)?;
        let resolved = self.resolver.resolve(&partial)?;
        let derived = self.engineer.derive(&resolved);

        let mut values = Vec::with_capacity(self.scaler.len());
        values.extend_from_slice(&resolved.values);
        values.extend_from_slice(&derived);
        values.extend(
            self.indicators
                .iter()
                .map(|field| if resolved.was_imputed(*field) { 1.0 } else { 0.0 }),
        );

        debug!(imputed = ?resolved.imputed, "record prepared");

        Ok(EncodedFeatureVector {
            values,
            imputed: resolved.imputed,
        })
    }

    pub fn classify(&self, features: &EncodedFeatureVector) -> ClassProbabilities {
        let scaled = self.scaler.scale(features.values());
        self.classifier.classify(&scaled)
    }

    pub fn predict(&self, raw: &RawRecord) -> Result<PredictionResult, PredictionError> {
        let features = self.prepare(raw)?;
        let probabilities = self.classify(&features);
        let result = self.composer.compose(&probabilities);

        debug!(
            prediction = result.label().index(),
            confidence = result.confidence(),
            low_confidence = result.is_low_confidence(),
            "severity predicted"
        );

        Ok(result)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model: self.metadata.model_name.clone(),
            version: self.metadata.version.clone(),
            strategy: self.strategy_name(),
            num_classes: CLASS_COUNT,
            class_mapping: self
                .metadata
                .class_mapping
                .iter()
                .enumerate()
                .map(|(index, name)| (index.to_string(), name.clone()))
                .collect(),
            performance: self.metadata.performance.clone(),
            features: self.metadata.feature_order.len(),
            feature_order: self.metadata.feature_order.clone(),
            low_confidence_threshold: self.composer.low_confidence_threshold(),
            description: self.metadata.description.clone(),
        }
    }
}
