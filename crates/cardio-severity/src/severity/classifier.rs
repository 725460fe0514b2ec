use serde::{Deserialize, Serialize};

use super::error::ArtifactError;
use super::label::{SeverityLabel, CLASS_COUNT};
use super::model::{Model, ModelWeights};

/// Lower bound for the hierarchical short-circuit threshold; keeps class 0 the argmax.
const MIN_NO_DISEASE_THRESHOLD: f64 = 0.5;

/// Classifier section of the bundle; the strategy is fixed per bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Direct {
        model: ModelWeights,
    },
    Hierarchical {
        /// Binary no-disease (index 0) / disease (index 1) detector.
        detector: ModelWeights,
        /// Mild-Moderate (index 0) / Severe-Critical (index 1), trained on diseased rows only.
        resolver: ModelWeights,
        no_disease_threshold: f64,
    },
}

impl ClassifierArtifact {
    pub fn strategy_name(&self) -> &'static str {
        match self {
            ClassifierArtifact::Direct { .. } => "direct",
            ClassifierArtifact::Hierarchical { .. } => "hierarchical",
        }
    }
}

/// Probability mass per reporting class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities([f64; CLASS_COUNT]);

impl ClassProbabilities {
    pub fn new(values: [f64; CLASS_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, label: SeverityLabel) -> f64 {
        self.0[label.index()]
    }

    pub fn as_array(&self) -> [f64; CLASS_COUNT] {
        self.0
    }

    /// Most probable class; an exact tie resolves to the less severe class.
    pub fn argmax(&self) -> SeverityLabel {
        let mut best = SeverityLabel::NoDisease;
        for label in SeverityLabel::ordered() {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }

    pub fn confidence(&self) -> f64 {
        self.get(self.argmax())
    }
}

#[derive(Debug, Clone)]
pub enum SeverityClassifier {
    Direct {
        model: Model,
    },
    Hierarchical {
        detector: Model,
        resolver: Model,
        no_disease_threshold: f64,
    },
}

impl SeverityClassifier {
    pub fn new(artifact: ClassifierArtifact, inputs: usize) -> Result<Self, ArtifactError> {
        match artifact {
            ClassifierArtifact::Direct { model } => Ok(Self::Direct {
                model: Model::new("direct", model, inputs, CLASS_COUNT)?,
            }),
            ClassifierArtifact::Hierarchical {
                detector,
                resolver,
                no_disease_threshold,
            } => {
                if !(MIN_NO_DISEASE_THRESHOLD..1.0).contains(&no_disease_threshold) {
                    return Err(ArtifactError::InvalidThreshold {
                        name: "no_disease_threshold",
                        value: no_disease_threshold,
                        range: "[0.5, 1)",
                    });
                }
                Ok(Self::Hierarchical {
                    detector: Model::new("detector", detector, inputs, 2)?,
                    resolver: Model::new("resolver", resolver, inputs, 2)?,
                    no_disease_threshold,
                })
            }
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            SeverityClassifier::Direct { .. } => "direct",
            SeverityClassifier::Hierarchical { .. } => "hierarchical",
        }
    }

    pub fn classify(&self, scaled: &[f64]) -> ClassProbabilities {
        match self {
            SeverityClassifier::Direct { model } => {
                let probabilities = model.predict_proba(scaled);
                ClassProbabilities::new([probabilities[0], probabilities[1], probabilities[2]])
            }
            SeverityClassifier::Hierarchical {
                detector,
                resolver,
                no_disease_threshold,
            } => {
                let no_disease = detector.predict_proba(scaled)[0];
                let remainder = 1.0 - no_disease;
                if no_disease > *no_disease_threshold {
                    return ClassProbabilities::new([no_disease, remainder / 2.0, remainder / 2.0]);
                }

                let severity = resolver.predict_proba(scaled);
                ClassProbabilities::new([
                    no_disease,
                    remainder * severity[0],
                    remainder * severity[1],
                ])
            }
        }
    }
}
