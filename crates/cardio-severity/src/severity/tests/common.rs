use axum::response::Response;
use serde_json::Value;

use crate::severity::artifacts::{BundleMetadata, ModelArtifactBundle, PerformanceMetrics};
use crate::severity::classifier::ClassifierArtifact;
use crate::severity::encoder::{Vocabulary, VocabularyEntry};
use crate::severity::features::{feature_names, EngineeringArtifact};
use crate::severity::imputer::{FieldImputation, ImputationStrategy, ImputerArtifact};
use crate::severity::label::{SeverityLabel, SeverityPresentation};
use crate::severity::model::{LinearModel, ModelWeights};
use crate::severity::pipeline::SeverityPipeline;
use crate::severity::record::{ClinicalField, RawRecord, RawValue};
use crate::severity::scaler::ScalerArtifact;

fn vocabulary(field: ClinicalField, entries: &[(&str, u32, &[&str])]) -> Vocabulary {
    Vocabulary {
        field,
        entries: entries
            .iter()
            .map(|(label, code, aliases)| VocabularyEntry {
                label: label.to_string(),
                code: *code,
                aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            })
            .collect(),
    }
}

pub(crate) fn standard_vocabularies() -> Vec<Vocabulary> {
    vec![
        vocabulary(
            ClinicalField::Sex,
            &[("male", 1, &["m"]), ("female", 0, &["f"])],
        ),
        vocabulary(
            ClinicalField::ChestPain,
            &[
                ("typical angina", 0, &["typical"]),
                ("atypical angina", 1, &["atypical"]),
                ("non-anginal", 2, &["non-anginal pain"]),
                ("asymptomatic", 3, &[]),
            ],
        ),
        vocabulary(
            ClinicalField::RestingEcg,
            &[
                ("normal", 0, &[]),
                ("st-t abnormality", 1, &["st-t wave abnormality"]),
                ("lv hypertrophy", 2, &["lv-hypertrophy"]),
            ],
        ),
        vocabulary(
            ClinicalField::StSlope,
            &[("upsloping", 0, &[]), ("flat", 1, &[]), ("downsloping", 2, &[])],
        ),
        vocabulary(
            ClinicalField::Thalassemia,
            &[
                ("normal", 0, &[]),
                ("fixed defect", 1, &["fixed-defect"]),
                ("reversable defect", 2, &["reversible defect"]),
            ],
        ),
    ]
}

fn policy(field: ClinicalField, strategy: ImputationStrategy, fallback: f64) -> FieldImputation {
    FieldImputation {
        field,
        strategy,
        fallback,
    }
}

pub(crate) fn standard_imputer() -> ImputerArtifact {
    let knn = ImputationStrategy::Knn { k: 5 };
    ImputerArtifact {
        fields: vec![
            policy(ClinicalField::RestingBloodPressure, knn, 130.0),
            policy(ClinicalField::Cholesterol, knn, 223.0),
            policy(ClinicalField::RestingEcg, ImputationStrategy::Fallback, 0.0),
            policy(ClinicalField::MaxHeartRate, knn, 140.0),
            policy(ClinicalField::StDepression, knn, 0.5),
            policy(ClinicalField::StSlope, ImputationStrategy::Fallback, 1.0),
            policy(
                ClinicalField::VesselCount,
                ImputationStrategy::FallbackWithIndicator,
                0.0,
            ),
            policy(
                ClinicalField::Thalassemia,
                ImputationStrategy::FallbackWithIndicator,
                0.0,
            ),
        ],
        donors: vec![
            donor([63.0, 1.0, 0.0, 145.0, 233.0, 1.0, 2.0, 150.0, 0.0, 2.3, 2.0, 0.0, 1.0]),
            donor([67.0, 1.0, 3.0, 160.0, 286.0, 0.0, 2.0, 108.0, 1.0, 1.5, 1.0, 3.0, 0.0]),
            donor([37.0, 1.0, 2.0, 130.0, 250.0, 0.0, 0.0, 187.0, 0.0, 3.5, 2.0, 0.0, 0.0]),
            donor([41.0, 0.0, 1.0, 130.0, 204.0, 0.0, 2.0, 172.0, 0.0, 1.4, 0.0, 0.0, 0.0]),
            donor([56.0, 1.0, 1.0, 120.0, 236.0, 0.0, 0.0, 178.0, 0.0, 0.8, 0.0, 0.0, 0.0]),
            donor([57.0, 0.0, 3.0, 120.0, 354.0, 0.0, 0.0, 163.0, 1.0, 0.6, 0.0, 0.0, 0.0]),
            vec![
                Some(54.0),
                Some(1.0),
                Some(3.0),
                Some(150.0),
                Some(365.0),
                Some(0.0),
                Some(1.0),
                Some(134.0),
                Some(0.0),
                Some(1.0),
                None,
                None,
                None,
            ],
        ],
    }
}

fn donor(values: [f64; 13]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

pub(crate) fn feature_order() -> Vec<String> {
    feature_names(&[ClinicalField::VesselCount, ClinicalField::Thalassemia])
}

pub(crate) fn scaler_artifact() -> ScalerArtifact {
    ScalerArtifact {
        mean: vec![
            53.5, 0.79, 2.25, 132.1, 199.1, 0.15, 0.6, 137.5, 0.39, 0.88, 0.9, 0.25, 0.45, 1.25,
            1.75, 0.8, 29.0, 3.3, 0.66, 0.53,
        ],
        scale: vec![
            9.4, 0.41, 0.93, 18.4, 109.2, 0.36, 0.8, 25.9, 0.49, 1.09, 0.6, 0.6, 0.75, 0.55, 1.1,
            0.8, 29.5, 2.6, 0.47, 0.5,
        ],
    }
}

pub(crate) fn direct_model() -> ModelWeights {
    ModelWeights::Linear(LinearModel {
        coefficients: vec![
            vec![
                -0.35, -0.45, -0.55, -0.12, -0.08, -0.05, -0.10, 0.40, -0.50, -0.55, -0.35, -0.70,
                -0.60, -0.15, -0.08, -0.05, -0.30, -0.40, 0.10, 0.05,
            ],
            vec![
                0.10, 0.15, 0.20, 0.02, 0.03, 0.00, 0.04, -0.10, 0.20, 0.10, 0.12, 0.15, 0.25,
                0.05, 0.02, 0.02, 0.08, 0.10, 0.05, 0.05,
            ],
            vec![
                0.25, 0.30, 0.35, 0.10, 0.05, 0.05, 0.06, -0.30, 0.30, 0.45, 0.23, 0.55, 0.35,
                0.10, 0.06, 0.03, 0.22, 0.30, -0.15, -0.10,
            ],
        ],
        intercepts: vec![0.45, 0.05, -0.50],
    })
}

/// Binary linear model over the fixture layout with only an intercept.
pub(crate) fn intercept_only(intercepts: Vec<f64>) -> ModelWeights {
    ModelWeights::Linear(LinearModel {
        coefficients: vec![vec![0.0; feature_order().len()]; intercepts.len()],
        intercepts,
    })
}

pub(crate) fn metadata() -> BundleMetadata {
    BundleMetadata {
        model_name: "Fixture Severity Model".to_string(),
        version: "test".to_string(),
        trained_at: None,
        description: "fixture bundle".to_string(),
        feature_order: feature_order(),
        class_mapping: SeverityLabel::ordered()
            .iter()
            .map(|label| label.name().to_string())
            .collect(),
        severity_grouping: vec![0, 1, 1, 2, 2],
        low_confidence_threshold: 0.6,
        performance: PerformanceMetrics {
            test_f1_weighted: 0.71,
            test_accuracy: 0.72,
            f1_per_class: vec![0.84, 0.58, 0.41],
        },
    }
}

pub(crate) fn direct_bundle() -> ModelArtifactBundle {
    ModelArtifactBundle {
        metadata: metadata(),
        encoders: standard_vocabularies(),
        imputer: standard_imputer(),
        engineering: EngineeringArtifact::default(),
        scaler: scaler_artifact(),
        classifier: ClassifierArtifact::Direct {
            model: direct_model(),
        },
        presentation: SeverityPresentation::standard(),
    }
}

pub(crate) fn hierarchical_bundle(
    detector: ModelWeights,
    resolver: ModelWeights,
    no_disease_threshold: f64,
) -> ModelArtifactBundle {
    ModelArtifactBundle {
        classifier: ClassifierArtifact::Hierarchical {
            detector,
            resolver,
            no_disease_threshold,
        },
        ..direct_bundle()
    }
}

pub(crate) fn direct_pipeline() -> SeverityPipeline {
    SeverityPipeline::from_bundle(direct_bundle()).expect("fixture bundle is consistent")
}

/// Reference record: 63-year-old male, typical angina, fixed defect.
pub(crate) fn sample_raw_record() -> RawRecord {
    RawRecord::new()
        .with("age", RawValue::Number(63.0))
        .with("sex", RawValue::Text("Male".to_string()))
        .with("cp", RawValue::Text("typical angina".to_string()))
        .with("trestbps", RawValue::Number(145.0))
        .with("chol", RawValue::Number(233.0))
        .with("fbs", RawValue::Flag(true))
        .with("restecg", RawValue::Text("lv hypertrophy".to_string()))
        .with("thalch", RawValue::Number(150.0))
        .with("exang", RawValue::Flag(false))
        .with("oldpeak", RawValue::Number(2.3))
        .with("slope", RawValue::Text("downsloping".to_string()))
        .with("ca", RawValue::Number(0.0))
        .with("thal", RawValue::Text("fixed defect".to_string()))
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
