use serde::Serialize;
use std::collections::BTreeMap;

use super::classifier::ClassProbabilities;
use super::error::ArtifactError;
use super::label::{SeverityLabel, SeverityPresentation};

pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f64 = 0.60;

pub const LOW_CONFIDENCE_ACTION: &str =
    "Confidence is below threshold - please consult a healthcare professional to review these results";

/// User-facing wording for a confidence value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceDescription {
    pub text: &'static str,
    pub color: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub warning: bool,
}

impl ConfidenceDescription {
    pub fn for_confidence(confidence: f64) -> Self {
        let (text, color, warning) = if confidence >= 0.9 {
            ("Very Confident", "#4CAF50", false)
        } else if confidence >= 0.75 {
            ("Confident", "#8BC34A", false)
        } else if confidence >= 0.60 {
            ("Moderately Confident", "#FFC107", false)
        } else {
            ("Low Confidence", "#FF6B35", true)
        };
        Self {
            text,
            color,
            warning,
        }
    }
}

/// Public prediction contract. Built once by the composer; read through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    prediction: SeverityLabel,
    confidence: f64,
    probabilities: BTreeMap<String, f64>,
    risk_category: String,
    risk_level: String,
    risk_color: String,
    background_color: String,
    icon: String,
    action_items: Vec<String>,
    low_confidence: bool,
    title: String,
    message: String,
    urgency: String,
    confidence_description: ConfidenceDescription,
}

impl PredictionResult {
    pub fn label(&self) -> SeverityLabel {
        self.prediction
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn probability(&self, label: SeverityLabel) -> f64 {
        self.probabilities
            .get(&label.index().to_string())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn probabilities(&self) -> &BTreeMap<String, f64> {
        &self.probabilities
    }

    pub fn risk_category(&self) -> &str {
        &self.risk_category
    }

    pub fn risk_level(&self) -> &str {
        &self.risk_level
    }

    pub fn risk_color(&self) -> &str {
        &self.risk_color
    }

    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn action_items(&self) -> &[String] {
        &self.action_items
    }

    pub fn is_low_confidence(&self) -> bool {
        self.low_confidence
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn urgency(&self) -> &str {
        &self.urgency
    }
}

#[derive(Debug, Clone)]
pub struct ResponseComposer {
    presentation: Vec<SeverityPresentation>,
    low_confidence_threshold: f64,
}

impl ResponseComposer {
    pub fn new(
        presentation: Vec<SeverityPresentation>,
        low_confidence_threshold: f64,
    ) -> Result<Self, ArtifactError> {
        SeverityPresentation::verify_table(&presentation)?;
        validate_threshold(low_confidence_threshold)?;
        Ok(Self {
            presentation,
            low_confidence_threshold,
        })
    }

    pub fn low_confidence_threshold(&self) -> f64 {
        self.low_confidence_threshold
    }

    pub(crate) fn set_low_confidence_threshold(
        &mut self,
        threshold: f64,
    ) -> Result<(), ArtifactError> {
        validate_threshold(threshold)?;
        self.low_confidence_threshold = threshold;
        Ok(())
    }

    pub fn compose(&self, probabilities: &ClassProbabilities) -> PredictionResult {
        let label = probabilities.argmax();
        let confidence = probabilities.confidence();
        // Table order is checked at construction.
        let entry = &self.presentation[label.index()];

        let mut action_items = entry.action_items.clone();
        let low_confidence = confidence < self.low_confidence_threshold;
        if low_confidence {
            action_items.push(LOW_CONFIDENCE_ACTION.to_string());
        }

        PredictionResult {
            prediction: label,
            confidence,
            probabilities: SeverityLabel::ordered()
                .into_iter()
                .map(|label| (label.index().to_string(), probabilities.get(label)))
                .collect(),
            risk_category: label.name().to_string(),
            risk_level: entry.risk_level.clone(),
            risk_color: entry.color.clone(),
            background_color: entry.background_color.clone(),
            icon: entry.icon.clone(),
            action_items,
            low_confidence,
            title: entry.title.clone(),
            message: entry.message.clone(),
            urgency: entry.urgency.clone(),
            confidence_description: ConfidenceDescription::for_confidence(confidence),
        }
    }
}

fn validate_threshold(threshold: f64) -> Result<(), ArtifactError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ArtifactError::InvalidThreshold {
            name: "low_confidence_threshold",
            value: threshold,
            range: "[0, 1]",
        })
    }
}
