use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::error::{ArtifactError, PredictionError};
use super::record::{ClinicalField, ClinicalRecord, FieldKind, RawValue, BASE_FEATURE_COUNT};

/// One accepted spelling of a categorical value and the code the model was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub label: String,
    pub code: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Persisted vocabulary for a single categorical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub field: ClinicalField,
    pub entries: Vec<VocabularyEntry>,
}

impl Vocabulary {
    fn lookup_text(&self, text: &str) -> Option<u32> {
        let needle = text.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|entry| {
                entry.label.to_ascii_lowercase() == needle
                    || entry
                        .aliases
                        .iter()
                        .any(|alias| alias.to_ascii_lowercase() == needle)
            })
            .map(|entry| entry.code)
            .or_else(|| {
                needle
                    .parse::<f64>()
                    .ok()
                    .and_then(|number| self.lookup_code(number))
            })
    }

    fn lookup_code(&self, number: f64) -> Option<u32> {
        if number.fract() != 0.0 || number < 0.0 {
            return None;
        }
        self.entries
            .iter()
            .map(|entry| entry.code)
            .find(|code| f64::from(*code) == number)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        let field = self.field.key();
        if self.field.kind() != FieldKind::Categorical {
            return Err(ArtifactError::Vocabulary {
                field,
                reason: "field is not categorical".to_string(),
            });
        }
        if self.entries.is_empty() {
            return Err(ArtifactError::Vocabulary {
                field,
                reason: "no entries".to_string(),
            });
        }

        let mut spellings = HashSet::new();
        let mut codes = HashSet::new();
        for entry in &self.entries {
            if !codes.insert(entry.code) {
                return Err(ArtifactError::Vocabulary {
                    field,
                    reason: format!("code {} assigned twice", entry.code),
                });
            }
            for spelling in std::iter::once(&entry.label).chain(&entry.aliases) {
                if !spellings.insert(spelling.trim().to_ascii_lowercase()) {
                    return Err(ArtifactError::Vocabulary {
                        field,
                        reason: format!("'{spelling}' maps to more than one code"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Encoded base features; `None` marks an absent value.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialVector {
    values: [Option<f64>; BASE_FEATURE_COUNT],
}

impl PartialVector {
    pub fn new(values: [Option<f64>; BASE_FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, field: ClinicalField) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn values(&self) -> &[Option<f64>; BASE_FEATURE_COUNT] {
        &self.values
    }

    /// Fields with no observed value.
    pub fn missing(&self) -> Vec<ClinicalField> {
        ClinicalField::ordered()
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }
}

/// Maps categorical and flag inputs to training-time integer codes.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    vocabularies: BTreeMap<ClinicalField, Vocabulary>,
}

impl FeatureEncoder {
    pub fn new(vocabularies: Vec<Vocabulary>) -> Result<Self, ArtifactError> {
        let mut by_field = BTreeMap::new();
        for vocabulary in vocabularies {
            vocabulary.validate()?;
            let field = vocabulary.field;
            if by_field.insert(field, vocabulary).is_some() {
                return Err(ArtifactError::Vocabulary {
                    field: field.key(),
                    reason: "declared more than once".to_string(),
                });
            }
        }

        for field in ClinicalField::ordered() {
            if field.kind() == FieldKind::Categorical && !by_field.contains_key(&field) {
                return Err(ArtifactError::Vocabulary {
                    field: field.key(),
                    reason: "vocabulary missing from bundle".to_string(),
                });
            }
        }

        Ok(Self {
            vocabularies: by_field,
        })
    }

    pub fn encode(&self, record: &ClinicalRecord) -> Result<PartialVector, PredictionError> {
        let mut values = [None; BASE_FEATURE_COUNT];
        for field in ClinicalField::ordered() {
            let Some(value) = record.value(field) else {
                continue;
            };
            values[field.index()] = Some(self.encode_value(field, value)?);
        }
        Ok(PartialVector::new(values))
    }

    fn encode_value(&self, field: ClinicalField, value: &RawValue) -> Result<f64, PredictionError> {
        let invalid = || PredictionError::InvalidCategory {
            field: field.key(),
            value: match value {
                RawValue::Flag(flag) => flag.to_string(),
                RawValue::Number(number) => number.to_string(),
                RawValue::Text(text) => text.clone(),
            },
        };

        match field.kind() {
            FieldKind::Numeric => match value {
                RawValue::Number(number) => Ok(*number),
                _ => Err(invalid()),
            },
            FieldKind::Flag => encode_flag(value).ok_or_else(invalid),
            FieldKind::Categorical => {
                let vocabulary = self.vocabularies.get(&field).ok_or_else(invalid)?;
                let code = match value {
                    RawValue::Text(text) => vocabulary.lookup_text(text),
                    RawValue::Number(number) => vocabulary.lookup_code(*number),
                    RawValue::Flag(_) => None,
                };
                code.map(f64::from).ok_or_else(invalid)
            }
        }
    }
}

fn encode_flag(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Flag(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        RawValue::Number(number) if *number == 0.0 || *number == 1.0 => Some(*number),
        RawValue::Number(_) => None,
        RawValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(1.0),
            "false" | "0" | "no" => Some(0.0),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::record::RawRecord;
    use crate::severity::tests::common::{sample_raw_record, standard_vocabularies};

    fn encoder() -> FeatureEncoder {
        FeatureEncoder::new(standard_vocabularies()).expect("vocabularies are valid")
    }

    #[test]
    fn encodes_categorical_and_flag_fields() {
        let record = ClinicalRecord::from_raw(&sample_raw_record()).expect("valid record");
        let encoded = encoder().encode(&record).expect("record encodes");

        assert_eq!(encoded.get(ClinicalField::Sex), Some(1.0));
        assert_eq!(encoded.get(ClinicalField::ChestPain), Some(0.0));
        assert_eq!(encoded.get(ClinicalField::FastingBloodSugar), Some(1.0));
        assert_eq!(encoded.get(ClinicalField::ExerciseAngina), Some(0.0));
        assert_eq!(encoded.get(ClinicalField::RestingEcg), Some(2.0));
        assert_eq!(encoded.get(ClinicalField::StSlope), Some(2.0));
        assert_eq!(encoded.get(ClinicalField::Thalassemia), Some(1.0));
        assert_eq!(encoded.get(ClinicalField::StDepression), Some(2.3));
        assert!(encoded.missing().is_empty());
    }

    #[test]
    fn matches_labels_case_insensitively_and_accepts_codes() {
        let mut raw = sample_raw_record();
        raw.insert("cp", RawValue::Text("  Asymptomatic ".to_string()));
        raw.insert("sex", RawValue::Number(0.0));
        raw.insert("exang", RawValue::Text("TRUE".to_string()));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        let encoded = encoder().encode(&record).expect("record encodes");

        assert_eq!(encoded.get(ClinicalField::ChestPain), Some(3.0));
        assert_eq!(encoded.get(ClinicalField::Sex), Some(0.0));
        assert_eq!(encoded.get(ClinicalField::ExerciseAngina), Some(1.0));
    }

    #[test]
    fn numeric_text_resolves_through_codes() {
        let mut raw = sample_raw_record();
        raw.insert("sex", RawValue::Text("1".to_string()));
        raw.insert("cp", RawValue::Text(" 3 ".to_string()));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        let encoded = encoder().encode(&record).expect("record encodes");
        assert_eq!(encoded.get(ClinicalField::Sex), Some(1.0));
        assert_eq!(encoded.get(ClinicalField::ChestPain), Some(3.0));

        raw.insert("sex", RawValue::Text("0".to_string()));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        let encoded = encoder().encode(&record).expect("record encodes");
        assert_eq!(encoded.get(ClinicalField::Sex), Some(0.0));

        raw.insert("cp", RawValue::Text("4".to_string()));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        assert!(matches!(
            encoder().encode(&record),
            Err(PredictionError::InvalidCategory { field: "cp", .. })
        ));
    }

    #[test]
    fn rejects_values_outside_vocabulary() {
        let mut raw = sample_raw_record();
        raw.insert("cp", RawValue::Text("unknown".to_string()));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");

        match encoder().encode(&record) {
            Err(PredictionError::InvalidCategory { field, value }) => {
                assert_eq!(field, "cp");
                assert_eq!(value, "unknown");
            }
            other => panic!("expected invalid category, got {other:?}"),
        }

        let mut raw = sample_raw_record();
        raw.insert("thal", RawValue::Number(7.0));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        assert!(matches!(
            encoder().encode(&record),
            Err(PredictionError::InvalidCategory { field: "thal", .. })
        ));

        let mut raw = sample_raw_record();
        raw.insert("fbs", RawValue::Number(2.0));
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        assert!(matches!(
            encoder().encode(&record),
            Err(PredictionError::InvalidCategory { field: "fbs", .. })
        ));
    }

    #[test]
    fn absent_optional_fields_stay_unset() {
        let mut raw: RawRecord = sample_raw_record();
        raw.remove("ca");
        raw.remove("thal");
        let record = ClinicalRecord::from_raw(&raw).expect("valid record");
        let encoded = encoder().encode(&record).expect("record encodes");

        assert_eq!(
            encoded.missing(),
            vec![ClinicalField::VesselCount, ClinicalField::Thalassemia]
        );
    }

    #[test]
    fn rejects_incomplete_or_ambiguous_vocabularies() {
        let mut vocabularies = standard_vocabularies();
        vocabularies.retain(|vocabulary| vocabulary.field != ClinicalField::StSlope);
        assert!(matches!(
            FeatureEncoder::new(vocabularies),
            Err(ArtifactError::Vocabulary { field: "slope", .. })
        ));

        let mut vocabularies = standard_vocabularies();
        vocabularies[0].entries[1].code = vocabularies[0].entries[0].code;
        assert!(FeatureEncoder::new(vocabularies).is_err());
    }
}
