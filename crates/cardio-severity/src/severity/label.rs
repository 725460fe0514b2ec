use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ArtifactError;

/// Number of reporting classes after grouping.
pub const CLASS_COUNT: usize = 3;

/// Three-level reporting scale derived from the five-level clinical severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SeverityLabel {
    NoDisease = 0,
    MildModerate = 1,
    SevereCritical = 2,
}

/// Original severity level (0..=4) to reporting class. Fixed; every artifact is built against it.
pub const SEVERITY_GROUPING: [SeverityLabel; 5] = [
    SeverityLabel::NoDisease,
    SeverityLabel::MildModerate,
    SeverityLabel::MildModerate,
    SeverityLabel::SevereCritical,
    SeverityLabel::SevereCritical,
];

impl SeverityLabel {
    pub const fn ordered() -> [Self; CLASS_COUNT] {
        [Self::NoDisease, Self::MildModerate, Self::SevereCritical]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NoDisease => "No Disease",
            Self::MildModerate => "Mild-Moderate",
            Self::SevereCritical => "Severe-Critical",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ordered().get(index).copied()
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<SeverityLabel> for u8 {
    fn from(label: SeverityLabel) -> Self {
        label as u8
    }
}

impl TryFrom<u8> for SeverityLabel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize)
            .ok_or_else(|| format!("severity class {value} is outside 0..={}", CLASS_COUNT - 1))
    }
}

/// Reduce an original 0..=4 severity level to its reporting class.
pub fn group_severity(original: u8) -> Option<SeverityLabel> {
    SEVERITY_GROUPING.get(original as usize).copied()
}

/// Check a bundle's persisted grouping and class names against the fixed tables.
pub(crate) fn verify_grouping(
    grouping: &[u8],
    class_mapping: &[String],
) -> Result<(), ArtifactError> {
    let expected: Vec<u8> = SEVERITY_GROUPING.iter().map(|label| u8::from(*label)).collect();
    if grouping != expected.as_slice() {
        return Err(ArtifactError::InconsistentTables(format!(
            "severity grouping {grouping:?} differs from {expected:?}"
        )));
    }

    if class_mapping.len() != CLASS_COUNT {
        return Err(ArtifactError::InconsistentTables(format!(
            "class mapping has {} entries, expected {CLASS_COUNT}",
            class_mapping.len()
        )));
    }

    for (label, name) in SeverityLabel::ordered().into_iter().zip(class_mapping) {
        if !name.trim().eq_ignore_ascii_case(label.name()) {
            return Err(ArtifactError::InconsistentTables(format!(
                "class {} is named '{name}', expected '{}'",
                label.index(),
                label.name()
            )));
        }
    }

    Ok(())
}

/// Display and guidance attached to a reporting class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPresentation {
    pub label: SeverityLabel,
    pub risk_level: String,
    pub title: String,
    pub message: String,
    pub color: String,
    pub background_color: String,
    pub icon: String,
    pub urgency: String,
    pub action_items: Vec<String>,
}

impl SeverityPresentation {
    /// Tables shipped with the service; bundles may override them.
    pub fn standard() -> Vec<Self> {
        vec![
            Self {
                label: SeverityLabel::NoDisease,
                risk_level: "Low Risk".to_string(),
                title: "Low Risk - Looking Good!".to_string(),
                message: "Based on your information, your heart disease risk appears to be low. Keep up the healthy habits!".to_string(),
                color: "#4CAF50".to_string(),
                background_color: "#E8F5E9".to_string(),
                icon: "check_circle".to_string(),
                urgency: "none".to_string(),
                action_items: strings(&[
                    "Maintain your current healthy lifestyle",
                    "Schedule routine check-ups annually",
                    "Continue regular exercise (30+ minutes, 5 days/week)",
                    "Eat a heart-healthy diet rich in fruits and vegetables",
                    "Monitor your blood pressure at home monthly",
                ]),
            },
            Self {
                label: SeverityLabel::MildModerate,
                risk_level: "Moderate Risk".to_string(),
                title: "Mild to Moderate Risk Detected".to_string(),
                message: "Your assessment shows some factors that indicate mild to moderate heart disease risk. A consultation with your doctor is recommended to discuss lifestyle changes and monitoring.".to_string(),
                color: "#FF9800".to_string(),
                background_color: "#FFF3E0".to_string(),
                icon: "warning".to_string(),
                urgency: "medium".to_string(),
                action_items: strings(&[
                    "Schedule a consultation with your primary care doctor within 2-4 weeks",
                    "Discuss lifestyle modifications (diet, exercise, stress management)",
                    "Get a comprehensive metabolic panel and lipid profile blood test",
                    "Consider joining a cardiac rehabilitation or wellness program",
                    "Monitor symptoms (chest pain, shortness of breath) and track changes",
                    "Reduce sodium intake and maintain healthy weight",
                ]),
            },
            Self {
                label: SeverityLabel::SevereCritical,
                risk_level: "High Risk".to_string(),
                title: "Severe Risk - Urgent Action Needed".to_string(),
                message: "Your assessment indicates severe heart disease risk factors. Seek medical attention urgently within 24-48 hours.".to_string(),
                color: "#E91E63".to_string(),
                background_color: "#FCE4EC".to_string(),
                icon: "error".to_string(),
                urgency: "high".to_string(),
                action_items: strings(&[
                    "Contact a cardiologist IMMEDIATELY for urgent consultation (within 24-48 hours)",
                    "Do not delay - severe risk factors detected",
                    "Avoid strenuous physical activity until medically evaluated",
                    "Keep a detailed symptom diary (chest pain, breathing difficulty, fatigue)",
                    "Have someone accompany you to medical appointments",
                    "Bring complete medical history, current medications, and this assessment",
                    "If experiencing acute symptoms (severe chest pain, shortness of breath), call 911",
                ]),
            },
        ]
    }

    pub(crate) fn verify_table(table: &[Self]) -> Result<(), ArtifactError> {
        if table.len() != CLASS_COUNT {
            return Err(ArtifactError::InconsistentTables(format!(
                "presentation table has {} entries, expected {CLASS_COUNT}",
                table.len()
            )));
        }

        for (expected, entry) in SeverityLabel::ordered().into_iter().zip(table) {
            if entry.label != expected {
                return Err(ArtifactError::InconsistentTables(format!(
                    "presentation entry {} describes class {}",
                    expected.index(),
                    entry.label.index()
                )));
            }
            if !is_hex_color(&entry.color) || !is_hex_color(&entry.background_color) {
                return Err(ArtifactError::InconsistentTables(format!(
                    "class {} has a non-hex color",
                    expected.index()
                )));
            }
            if entry.action_items.is_empty() {
                return Err(ArtifactError::InconsistentTables(format!(
                    "class {} has no action items",
                    expected.index()
                )));
            }
        }

        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
