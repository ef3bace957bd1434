//! Multi-class inference over fitted model artifacts.
//!
//! This crate loads the classifier and label vocabulary produced at
//! training time and runs them locally. It provides:
//! - the `ProbabilityClassifier` trait the recommender scores through
//! - `BoostedTreeClassifier`, a softmax gradient-boosted tree ensemble
//! - `LabelDecoder`, mapping class indices back to dish names

use thiserror::Error;

pub mod boosted;
pub mod labels;

pub use boosted::{BoostedTreeClassifier, Node, Tree};
pub use labels::LabelDecoder;

/// Errors that can occur when loading or running model artifacts
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("Classifier expects {expected} features but received {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A fitted multi-class classifier that outputs class probabilities.
///
/// ## Design Note
/// - `Send + Sync` so one loaded model serves concurrent requests
/// - Probabilities are the model's native output: non-negative and summing
///   to 1, never renormalized by callers
pub trait ProbabilityClassifier: Send + Sync {
    /// Width of the input vector
    fn num_features(&self) -> usize;

    /// Number of classes in the output distribution
    fn num_classes(&self) -> usize;

    /// Input column names recorded at training time, if the artifact has them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Probability of each class, indexed by class
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
}

pub(crate) fn read_artifact(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ModelError::Unreadable {
        path: path.display().to_string(),
        source,
    })
}
