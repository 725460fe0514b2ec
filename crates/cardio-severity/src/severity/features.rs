use serde::{Deserialize, Serialize};

use super::error::ArtifactError;
use super::imputer::ResolvedFeatures;
use super::record::{ClinicalField, BASE_FEATURE_COUNT};

pub const ENGINEERED_FEATURE_COUNT: usize = 5;

/// Derived features appended after the base block, in this order.
pub const ENGINEERED_FEATURES: [&str; ENGINEERED_FEATURE_COUNT] = [
    "age_group",
    "bp_category",
    "chol_category",
    "hr_reserve",
    "cv_risk_score",
];

const AGE_BINS: [f64; 5] = [0.0, 40.0, 60.0, 80.0, 100.0];
const BP_BINS: [f64; 5] = [0.0, 120.0, 130.0, 140.0, 200.0];
const CHOLESTEROL_BINS: [f64; 4] = [0.0, 200.0, 240.0, 600.0];
/// Bucket used when a value falls outside every bin.
const OUT_OF_BINS_BUCKET: f64 = 1.0;

/// Composite risk score weights, fixed when the model was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScoreWeights {
    pub age_over_55: f64,
    pub resting_bp_over_140: f64,
    pub cholesterol_over_240: f64,
    pub fasting_blood_sugar: f64,
    pub exercise_angina: f64,
    pub st_depression_over_2: f64,
}

impl Default for RiskScoreWeights {
    fn default() -> Self {
        Self {
            age_over_55: 2.0,
            resting_bp_over_140: 2.0,
            cholesterol_over_240: 1.0,
            fasting_blood_sugar: 1.0,
            exercise_angina: 2.0,
            st_depression_over_2: 3.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineeringArtifact {
    #[serde(default)]
    pub risk_score: RiskScoreWeights,
}

#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    weights: RiskScoreWeights,
}

impl FeatureEngineer {
    pub fn new(artifact: EngineeringArtifact) -> Result<Self, ArtifactError> {
        let weights = artifact.risk_score;
        let all_finite = [
            weights.age_over_55,
            weights.resting_bp_over_140,
            weights.cholesterol_over_240,
            weights.fasting_blood_sugar,
            weights.exercise_angina,
            weights.st_depression_over_2,
        ]
        .iter()
        .all(|weight| weight.is_finite());
        if !all_finite {
            return Err(ArtifactError::Model {
                name: "risk_score",
                reason: "weights must be finite".to_string(),
            });
        }
        Ok(Self { weights })
    }

    pub fn derive(&self, resolved: &ResolvedFeatures) -> [f64; ENGINEERED_FEATURE_COUNT] {
        let age = resolved.get(ClinicalField::Age);
        let resting_bp = resolved.get(ClinicalField::RestingBloodPressure);
        let cholesterol = resolved.get(ClinicalField::Cholesterol);
        let max_hr = resolved.get(ClinicalField::MaxHeartRate);

        [
            bucket(age, &AGE_BINS),
            bucket(resting_bp, &BP_BINS),
            bucket(cholesterol, &CHOLESTEROL_BINS),
            heart_rate_reserve(age, max_hr),
            self.risk_score(resolved),
        ]
    }

    fn risk_score(&self, resolved: &ResolvedFeatures) -> f64 {
        let w = &self.weights;
        let indicator = |condition: bool, weight: f64| if condition { weight } else { 0.0 };

        indicator(resolved.get(ClinicalField::Age) > 55.0, w.age_over_55)
            + indicator(
                resolved.get(ClinicalField::RestingBloodPressure) > 140.0,
                w.resting_bp_over_140,
            )
            + indicator(
                resolved.get(ClinicalField::Cholesterol) > 240.0,
                w.cholesterol_over_240,
            )
            + indicator(
                resolved.get(ClinicalField::FastingBloodSugar) == 1.0,
                w.fasting_blood_sugar,
            )
            + indicator(
                resolved.get(ClinicalField::ExerciseAngina) == 1.0,
                w.exercise_angina,
            )
            + indicator(
                resolved.get(ClinicalField::StDepression) > 2.0,
                w.st_depression_over_2,
            )
    }
}

/// Age-predicted maximum minus observed maximum; negative when the observed rate is higher.
pub fn heart_rate_reserve(age: f64, observed_max_hr: f64) -> f64 {
    (220.0 - age) - observed_max_hr
}

/// Right-closed bins `(edges[i], edges[i + 1]]` mapped to `i`.
fn bucket(value: f64, edges: &[f64]) -> f64 {
    edges
        .windows(2)
        .position(|bounds| value > bounds[0] && value <= bounds[1])
        .map(|index| index as f64)
        .unwrap_or(OUT_OF_BINS_BUCKET)
}

/// Column names of the assembled vector: base block, derived block, then indicators.
pub fn feature_names(indicators: &[ClinicalField]) -> Vec<String> {
    ClinicalField::ordered()
        .iter()
        .map(|field| field.key().to_string())
        .chain(ENGINEERED_FEATURES.iter().map(|name| name.to_string()))
        .chain(indicators.iter().map(|field| format!("{}_missing", field.key())))
        .collect()
}

pub const fn feature_count(indicators: usize) -> usize {
    BASE_FEATURE_COUNT + ENGINEERED_FEATURE_COUNT + indicators
}
