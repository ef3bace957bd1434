//! Gradient-boosted tree ensemble with a softmax objective.
//!
//! Artifact layout:
//!
//! ```json
//! {
//!   "num_class": 3,
//!   "num_features": 4,
//!   "base_score": 0.5,
//!   "feature_names": ["age", "stay_duration", "visits", "preferred_cuisine_Multi"],
//!   "trees": [
//!     { "class": 0, "nodes": [
//!         { "split": { "feature": 1, "threshold": 2.5, "yes": 1, "no": 2 } },
//!         { "leaf": 0.4 },
//!         { "leaf": -0.1 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Each tree adds to the margin of its class. Split nodes send
//! `x[feature] < threshold` to `yes` and everything else to `no`.
//! Probabilities are the softmax of the per-class margins.

use crate::{read_artifact, ModelError, ProbabilityClassifier, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub class: usize,
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf.
    ///
    /// Termination is guaranteed by validation: children always have a
    /// larger index than their parent.
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                } => idx = if features[feature] < threshold { yes } else { no },
            }
        }
    }

    fn validate(&self, position: usize, num_class: usize, num_features: usize) -> Result<()> {
        let invalid = |reason: String| ModelError::Invalid(format!("tree {position}: {reason}"));

        if self.class >= num_class {
            return Err(invalid(format!(
                "class {} out of range for {} classes",
                self.class, num_class
            )));
        }
        if self.nodes.is_empty() {
            return Err(invalid("has no nodes".to_string()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf(value) if !value.is_finite() => {
                    return Err(invalid(format!("node {idx} has a non-finite leaf")));
                }
                Node::Split {
                    feature,
                    yes,
                    no,
                    threshold,
                } => {
                    if feature >= num_features {
                        return Err(invalid(format!(
                            "node {idx} splits on feature {feature} of {num_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(invalid(format!("node {idx} has a NaN threshold")));
                    }
                    for child in [yes, no] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(invalid(format!(
                                "node {idx} points to invalid child {child}"
                            )));
                        }
                    }
                }
                Node::Leaf(_) => {}
            }
        }
        Ok(())
    }
}

/// A multi-class boosted tree classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTreeClassifier {
    num_class: usize,
    num_features: usize,
    #[serde(default)]
    base_score: f64,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    trees: Vec<Tree>,
}

impl BoostedTreeClassifier {
    pub fn new(
        num_class: usize,
        num_features: usize,
        base_score: f64,
        feature_names: Option<Vec<String>>,
        trees: Vec<Tree>,
    ) -> Result<Self> {
        let model = Self {
            num_class,
            num_features,
            base_score,
            feature_names,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json).map_err(|source| ModelError::Malformed {
            path: origin.to_string(),
            source,
        })?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let model = Self::from_json_str(&read_artifact(path)?, &path.display().to_string())?;
        debug!(
            "Loaded boosted tree classifier: {} classes, {} features, {} trees",
            model.num_class,
            model.num_features,
            model.trees.len()
        );
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.num_class == 0 {
            return Err(ModelError::Invalid("num_class must be at least 1".to_string()));
        }
        if !self.base_score.is_finite() {
            return Err(ModelError::Invalid("base_score must be finite".to_string()));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.num_features {
                return Err(ModelError::Invalid(format!(
                    "{} feature names recorded for {} features",
                    names.len(),
                    self.num_features
                )));
            }
        }
        for (position, tree) in self.trees.iter().enumerate() {
            tree.validate(position, self.num_class, self.num_features)?;
        }
        Ok(())
    }

    /// Raw per-class scores before the softmax
    pub fn margins(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.num_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.num_features,
                found: features.len(),
            });
        }
        let mut margins = vec![self.base_score; self.num_class];
        for tree in &self.trees {
            margins[tree.class] += tree.evaluate(features);
        }
        Ok(margins)
    }
}

impl ProbabilityClassifier for BoostedTreeClassifier {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn num_classes(&self) -> usize {
        self.num_class
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        Ok(softmax(&self.margins(features)?))
    }
}

/// Numerically stable softmax
fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
