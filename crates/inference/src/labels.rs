//! Label vocabulary of the fitted classifier.

use crate::{read_artifact, ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Deserialize)]
struct LabelArtifact {
    classes: Vec<String>,
}

/// Maps class indices to dish names and back.
///
/// Class `i` of the classifier output is `classes[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelDecoder {
    classes: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl LabelDecoder {
    /// Build a decoder from an ordered, duplicate-free vocabulary
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(ModelError::Invalid("label vocabulary is empty".to_string()));
        }
        let mut positions = HashMap::with_capacity(classes.len());
        for (idx, label) in classes.iter().enumerate() {
            if positions.insert(label.clone(), idx).is_some() {
                return Err(ModelError::Invalid(format!("label {label} appears twice")));
            }
        }
        Ok(Self { classes, positions })
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self> {
        let artifact: LabelArtifact =
            serde_json::from_str(json).map_err(|source| ModelError::Malformed {
                path: origin.to_string(),
                source,
            })?;
        Self::new(artifact.classes)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_json_str(&read_artifact(path)?, &path.display().to_string())
    }

    /// Dish name for a class index
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Class index for a dish name
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
