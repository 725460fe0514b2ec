use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::encoder::PartialVector;
use super::error::{ArtifactError, PredictionError};
use super::record::{ClinicalField, BASE_FEATURE_COUNT};

/// Per-field imputation policy chosen at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Mean of the `k` nearest donor rows (nan-euclidean distance).
    Knn { k: usize },
    /// Training-time median or mode.
    Fallback,
    /// Training-time constant plus a missingness indicator feature.
    FallbackWithIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldImputation {
    pub field: ClinicalField,
    #[serde(flatten)]
    pub strategy: ImputationStrategy,
    /// Used directly by the fallback strategies and when k-NN finds no usable donor.
    pub fallback: f64,
}

/// Persisted imputer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputerArtifact {
    pub fields: Vec<FieldImputation>,
    /// Encoded training rows in base feature order; `null` for unobserved values.
    #[serde(default)]
    pub donors: Vec<Vec<Option<f64>>>,
}

/// Complete base features plus which optional fields were filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFeatures {
    pub values: [f64; BASE_FEATURE_COUNT],
    pub imputed: Vec<ClinicalField>,
}

impl ResolvedFeatures {
    pub fn get(&self, field: ClinicalField) -> f64 {
        self.values[field.index()]
    }

    pub fn was_imputed(&self, field: ClinicalField) -> bool {
        self.imputed.contains(&field)
    }
}

#[derive(Debug, Clone)]
pub struct MissingValueResolver {
    policies: BTreeMap<ClinicalField, FieldImputation>,
    donors: Vec<[Option<f64>; BASE_FEATURE_COUNT]>,
}

impl MissingValueResolver {
    pub fn new(artifact: ImputerArtifact) -> Result<Self, ArtifactError> {
        let mut policies = BTreeMap::new();
        for policy in artifact.fields {
            let field = policy.field;
            if field.is_required() {
                return Err(ArtifactError::Imputer(format!(
                    "required field {field} cannot carry an imputation policy"
                )));
            }
            if !policy.fallback.is_finite() {
                return Err(ArtifactError::Imputer(format!(
                    "fallback for {field} is not finite"
                )));
            }
            if let ImputationStrategy::Knn { k } = policy.strategy {
                if k == 0 {
                    return Err(ArtifactError::Imputer(format!(
                        "k-NN for {field} needs k >= 1"
                    )));
                }
            }
            if policies.insert(field, policy).is_some() {
                return Err(ArtifactError::Imputer(format!(
                    "{field} has more than one policy"
                )));
            }
        }

        if let Some(field) = ClinicalField::ordered()
            .into_iter()
            .find(|field| !field.is_required() && !policies.contains_key(field))
        {
            return Err(ArtifactError::Imputer(format!(
                "optional field {field} has no imputation policy"
            )));
        }

        let mut donors = Vec::with_capacity(artifact.donors.len());
        for (row, donor) in artifact.donors.into_iter().enumerate() {
            let donor: [Option<f64>; BASE_FEATURE_COUNT] =
                donor.try_into().map_err(|values: Vec<Option<f64>>| {
                    ArtifactError::Imputer(format!(
                        "donor row {row} has {} values, expected {BASE_FEATURE_COUNT}",
                        values.len()
                    ))
                })?;
            donors.push(donor);
        }

        let needs_donors = policies
            .values()
            .any(|policy| matches!(policy.strategy, ImputationStrategy::Knn { .. }));
        if needs_donors && donors.is_empty() {
            return Err(ArtifactError::Imputer(
                "k-NN policies require at least one donor row".to_string(),
            ));
        }

        Ok(Self { policies, donors })
    }

    /// Optional fields that contribute a missingness indicator, in base field order.
    pub fn indicator_fields(&self) -> Vec<ClinicalField> {
        self.policies
            .values()
            .filter(|policy| policy.strategy == ImputationStrategy::FallbackWithIndicator)
            .map(|policy| policy.field)
            .collect()
    }

    pub fn resolve(&self, partial: &PartialVector) -> Result<ResolvedFeatures, PredictionError> {
        let missing_required: Vec<&'static str> = partial
            .missing()
            .into_iter()
            .filter(|field| field.is_required())
            .map(ClinicalField::key)
            .collect();
        if !missing_required.is_empty() {
            return Err(PredictionError::MissingRequiredField {
                fields: missing_required,
            });
        }

        let mut values = [0.0; BASE_FEATURE_COUNT];
        let mut imputed = Vec::new();
        for field in ClinicalField::ordered() {
            values[field.index()] = match partial.get(field) {
                Some(value) => value,
                None => {
                    imputed.push(field);
                    self.impute(field, partial)
                }
            };
        }

        Ok(ResolvedFeatures { values, imputed })
    }

    fn impute(&self, field: ClinicalField, partial: &PartialVector) -> f64 {
        // Every optional field has a policy once construction succeeds.
        let Some(policy) = self.policies.get(&field) else {
            return 0.0;
        };

        match policy.strategy {
            ImputationStrategy::Knn { k } => {
                self.nearest_mean(field, partial, k).unwrap_or(policy.fallback)
            }
            ImputationStrategy::Fallback | ImputationStrategy::FallbackWithIndicator => {
                policy.fallback
            }
        }
    }

    /// Only observed query values take part in the distance, never other imputations.
    fn nearest_mean(&self, field: ClinicalField, partial: &PartialVector, k: usize) -> Option<f64> {
        let target = field.index();
        let mut candidates: Vec<(f64, f64)> = self
            .donors
            .iter()
            .filter_map(|donor| {
                let value = donor[target]?;
                let distance = nan_euclidean(partial.values(), donor)?;
                Some((distance, value))
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        // Stable sort keeps donor order on equal distances.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        let neighbours = &candidates[..k.min(candidates.len())];
        let sum: f64 = neighbours.iter().map(|(_, value)| value).sum();
        Some(sum / neighbours.len() as f64)
    }
}

/// Euclidean distance over coordinates present in both rows, rescaled by total/present.
fn nan_euclidean(
    query: &[Option<f64>; BASE_FEATURE_COUNT],
    donor: &[Option<f64>; BASE_FEATURE_COUNT],
) -> Option<f64> {
    let mut present = 0usize;
    let mut squared = 0.0;
    for (a, b) in query.iter().zip(donor) {
        if let (Some(a), Some(b)) = (a, b) {
            present += 1;
            squared += (a - b) * (a - b);
        }
    }

    if present == 0 {
        return None;
    }

    let weight = BASE_FEATURE_COUNT as f64 / present as f64;
    Some((weight * squared).sqrt())
}
