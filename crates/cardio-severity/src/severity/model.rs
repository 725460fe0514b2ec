//! Fitted model families the bundle can carry.
//!
//! Every model maps a scaled feature vector to a probability distribution. Single-output
//! models are read as binary classifiers (`sigmoid` for the positive class at index 1);
//! multi-output models go through a numerically stable softmax.

use serde::{Deserialize, Serialize};

use super::error::ArtifactError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelWeights {
    /// Multinomial logistic regression.
    Linear(LinearModel),
    /// Additive regression trees with one raw score per output (XGBoost layout).
    TreeEnsemble(TreeEnsemble),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// One row of coefficients per output.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub outputs: usize,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    /// Output the tree contributes to.
    pub output: usize,
    /// Node 0 is the root; children always sit after their parent.
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Goes left when `x[feature] < threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A validated model ready for inference.
#[derive(Debug, Clone)]
pub struct Model {
    name: &'static str,
    weights: ModelWeights,
    classes: usize,
}

impl Model {
    /// `classes` is the width of the distribution the caller expects back.
    pub fn new(
        name: &'static str,
        weights: ModelWeights,
        inputs: usize,
        classes: usize,
    ) -> Result<Self, ArtifactError> {
        let invalid = |reason: String| ArtifactError::Model { name, reason };
        let outputs = match &weights {
            ModelWeights::Linear(linear) => {
                if linear.coefficients.len() != linear.intercepts.len() {
                    return Err(invalid(format!(
                        "{} coefficient rows but {} intercepts",
                        linear.coefficients.len(),
                        linear.intercepts.len()
                    )));
                }
                for row in &linear.coefficients {
                    if row.len() != inputs {
                        return Err(ArtifactError::DimensionMismatch {
                            component: name,
                            expected: inputs,
                            found: row.len(),
                        });
                    }
                }
                let finite = linear
                    .coefficients
                    .iter()
                    .flatten()
                    .chain(&linear.intercepts)
                    .all(|value| value.is_finite());
                if !finite {
                    return Err(invalid("non-finite weight".to_string()));
                }
                linear.intercepts.len()
            }
            ModelWeights::TreeEnsemble(ensemble) => {
                if ensemble.trees.is_empty() {
                    return Err(invalid("ensemble has no trees".to_string()));
                }
                for (index, tree) in ensemble.trees.iter().enumerate() {
                    validate_tree(tree, ensemble.outputs, inputs)
                        .map_err(|reason| invalid(format!("tree {index}: {reason}")))?;
                }
                ensemble.outputs
            }
        };

        let supported = outputs == classes || (classes == 2 && outputs == 1);
        if !supported {
            return Err(invalid(format!(
                "{outputs} outputs cannot describe {classes} classes"
            )));
        }

        Ok(Self {
            name,
            weights,
            classes,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let raw = match &self.weights {
            ModelWeights::Linear(linear) => linear
                .coefficients
                .iter()
                .zip(&linear.intercepts)
                .map(|(row, intercept)| {
                    intercept + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>()
                })
                .collect::<Vec<_>>(),
            ModelWeights::TreeEnsemble(ensemble) => {
                let mut scores = vec![ensemble.base_score; ensemble.outputs];
                for tree in &ensemble.trees {
                    scores[tree.output] += tree.evaluate(features);
                }
                scores
            }
        };

        if raw.len() == 1 && self.classes == 2 {
            let positive = sigmoid(raw[0]);
            vec![1.0 - positive, positive]
        } else {
            softmax(&raw)
        }
    }
}

impl RegressionTree {
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn validate_tree(tree: &RegressionTree, outputs: usize, inputs: usize) -> Result<(), String> {
    if tree.output >= outputs {
        return Err(format!("targets output {} of {outputs}", tree.output));
    }
    if tree.nodes.is_empty() {
        return Err("has no nodes".to_string());
    }

    for (index, node) in tree.nodes.iter().enumerate() {
        match node {
            TreeNode::Leaf { value } if !value.is_finite() => {
                return Err(format!("node {index} has a non-finite leaf"));
            }
            TreeNode::Leaf { .. } => {}
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= inputs {
                    return Err(format!("node {index} splits on feature {feature}"));
                }
                if threshold.is_nan() {
                    return Err(format!("node {index} has a NaN threshold"));
                }
                for child in [*left, *right] {
                    if child <= index || child >= tree.nodes.len() {
                        return Err(format!("node {index} points at invalid child {child}"));
                    }
                }
            }
        }
    }

    Ok(())
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|score| (score - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|value| value / total).collect()
}
