use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::PredictionError;

/// Number of clinical attributes accepted per record.
pub const BASE_FEATURE_COUNT: usize = 13;

/// Clinical attributes in the column order the preprocessing artifacts were fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClinicalField {
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "sex")]
    Sex,
    #[serde(rename = "cp")]
    ChestPain,
    #[serde(rename = "trestbps")]
    RestingBloodPressure,
    #[serde(rename = "chol")]
    Cholesterol,
    #[serde(rename = "fbs")]
    FastingBloodSugar,
    #[serde(rename = "restecg")]
    RestingEcg,
    #[serde(rename = "thalch")]
    MaxHeartRate,
    #[serde(rename = "exang")]
    ExerciseAngina,
    #[serde(rename = "oldpeak")]
    StDepression,
    #[serde(rename = "slope")]
    StSlope,
    #[serde(rename = "ca")]
    VesselCount,
    #[serde(rename = "thal")]
    Thalassemia,
}

/// How a field's raw value becomes a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
    Flag,
}

impl ClinicalField {
    pub const fn ordered() -> [Self; BASE_FEATURE_COUNT] {
        [
            Self::Age,
            Self::Sex,
            Self::ChestPain,
            Self::RestingBloodPressure,
            Self::Cholesterol,
            Self::FastingBloodSugar,
            Self::RestingEcg,
            Self::MaxHeartRate,
            Self::ExerciseAngina,
            Self::StDepression,
            Self::StSlope,
            Self::VesselCount,
            Self::Thalassemia,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Sex => "sex",
            Self::ChestPain => "cp",
            Self::RestingBloodPressure => "trestbps",
            Self::Cholesterol => "chol",
            Self::FastingBloodSugar => "fbs",
            Self::RestingEcg => "restecg",
            Self::MaxHeartRate => "thalch",
            Self::ExerciseAngina => "exang",
            Self::StDepression => "oldpeak",
            Self::StSlope => "slope",
            Self::VesselCount => "ca",
            Self::Thalassemia => "thal",
        }
    }

    /// Position of the field inside the base feature block.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Sex | Self::ChestPain | Self::RestingEcg | Self::StSlope | Self::Thalassemia => {
                FieldKind::Categorical
            }
            Self::FastingBloodSugar | Self::ExerciseAngina => FieldKind::Flag,
            _ => FieldKind::Numeric,
        }
    }

    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Self::Age | Self::Sex | Self::ChestPain | Self::FastingBloodSugar | Self::ExerciseAngina
        )
    }

    /// Documented input domain for numeric fields.
    pub const fn valid_range(self) -> Option<(f64, f64)> {
        match self {
            Self::Age => Some((1.0, 120.0)),
            Self::RestingBloodPressure => Some((50.0, 250.0)),
            Self::Cholesterol => Some((0.0, 700.0)),
            Self::MaxHeartRate => Some((40.0, 250.0)),
            Self::StDepression => Some((-5.0, 10.0)),
            Self::VesselCount => Some((0.0, 4.0)),
            _ => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|field| field.key() == key.trim())
    }
}

impl fmt::Display for ClinicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single submitted value before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(text) if text.trim().is_empty())
    }

    fn describe(&self) -> String {
        match self {
            RawValue::Flag(flag) => flag.to_string(),
            RawValue::Number(number) => number.to_string(),
            RawValue::Text(text) => text.clone(),
        }
    }
}

/// Field name to value mapping as received from the serving boundary.
///
/// `null` and blank strings count as absent. Unknown keys (`id`, `dataset`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord(pub BTreeMap<String, Option<RawValue>>);

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut values = BTreeMap::new();
        for (key, value) in object {
            if ClinicalField::from_key(&key).is_none() {
                continue;
            }
            let value = Option::<RawValue>::deserialize(value).map_err(|_| {
                serde::de::Error::custom(format!(
                    "field `{key}` must be a string, number, boolean or null"
                ))
            })?;
            values.insert(key, value);
        }
        Ok(Self(values))
    }
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: RawValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: RawValue) {
        self.0.insert(key.to_string(), Some(value));
    }

    pub fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }

    fn get(&self, field: ClinicalField) -> Option<&RawValue> {
        self.0
            .get(field.key())
            .and_then(Option::as_ref)
            .filter(|value| !value.is_blank())
    }
}

/// Validated record: required fields present and numeric values inside their domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalRecord {
    values: [Option<RawValue>; BASE_FEATURE_COUNT],
}

impl ClinicalRecord {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, PredictionError> {
        let missing: Vec<&'static str> = ClinicalField::ordered()
            .into_iter()
            .filter(|field| field.is_required() && raw.get(*field).is_none())
            .map(ClinicalField::key)
            .collect();
        if !missing.is_empty() {
            return Err(PredictionError::MissingRequiredField { fields: missing });
        }

        let mut values: [Option<RawValue>; BASE_FEATURE_COUNT] = Default::default();
        for field in ClinicalField::ordered() {
            let Some(value) = raw.get(field) else {
                continue;
            };
            values[field.index()] = Some(match field.kind() {
                FieldKind::Numeric => RawValue::Number(numeric_value(field, value)?),
                FieldKind::Categorical | FieldKind::Flag => value.clone(),
            });
        }

        Ok(Self { values })
    }

    pub fn value(&self, field: ClinicalField) -> Option<&RawValue> {
        self.values[field.index()].as_ref()
    }

    pub fn is_present(&self, field: ClinicalField) -> bool {
        self.value(field).is_some()
    }
}

fn numeric_value(field: ClinicalField, value: &RawValue) -> Result<f64, PredictionError> {
    let number = match value {
        RawValue::Number(number) => *number,
        RawValue::Text(text) => {
            text.trim()
                .parse::<f64>()
                .map_err(|_| PredictionError::InvalidNumber {
                    field: field.key(),
                    value: text.clone(),
                })?
        }
        RawValue::Flag(_) => {
            return Err(PredictionError::InvalidNumber {
                field: field.key(),
                value: value.describe(),
            })
        }
    };

    if let Some((min, max)) = field.valid_range() {
        if !number.is_finite() || number < min || number > max {
            return Err(PredictionError::OutOfRangeValue {
                field: field.key(),
                value: number,
                min,
                max,
            });
        }
    }

    Ok(number)
}
