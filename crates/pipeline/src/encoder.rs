//! One-hot encoding of categorical columns.
//!
//! The artifact records, per trained column, the categories seen at fit
//! time:
//!
//! ```json
//! { "columns": [ { "name": "preferred_cuisine", "categories": ["Multi", "North Indian"] } ] }
//! ```
//!
//! Output columns are named `<column>_<category>` and come out column by
//! column, category by category.

use crate::aligner::CategoricalBlock;
use crate::error::{EncoderError, Result};
use crate::traits::CategoricalEncoder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One trained column and its category vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
struct EncoderArtifact {
    columns: Vec<EncodedColumn>,
}

/// A fitted one-hot encoder that ignores unknown categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoder {
    columns: Vec<EncodedColumn>,
    names_in: Vec<String>,
}

impl OneHotEncoder {
    /// Build an encoder from trained columns.
    ///
    /// Column names must be unique, as must categories within a column.
    pub fn new(columns: Vec<EncodedColumn>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(EncoderError::Invalid(format!(
                    "column {} appears more than once",
                    column.name
                )));
            }
            let mut categories = HashSet::new();
            if let Some(dup) = column.categories.iter().find(|c| !categories.insert(c.as_str())) {
                return Err(EncoderError::Invalid(format!(
                    "category {} repeated in column {}",
                    dup, column.name
                )));
            }
        }

        let names_in = columns.iter().map(|c| c.name.clone()).collect();
        Ok(Self { columns, names_in })
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self> {
        let artifact: EncoderArtifact =
            serde_json::from_str(json).map_err(|source| EncoderError::Malformed {
                path: origin.to_string(),
                source,
            })?;
        Self::new(artifact.columns)
    }

    /// Load a fitted encoder artifact from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| EncoderError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let encoder = Self::from_json_str(&json, &path.display().to_string())?;
        debug!(
            "Loaded one-hot encoder with {} columns and {} outputs",
            encoder.columns.len(),
            encoder.output_width()
        );
        Ok(encoder)
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    /// Total number of indicator columns
    pub fn output_width(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum()
    }
}

impl CategoricalEncoder for OneHotEncoder {
    fn feature_names_in(&self) -> &[String] {
        &self.names_in
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|column| {
                column
                    .categories
                    .iter()
                    .map(move |category| format!("{}_{}", column.name, category))
            })
            .collect()
    }

    fn transform(&self, block: &CategoricalBlock) -> Result<Vec<(String, f64)>> {
        if !block.column_names().eq(self.names_in.iter().map(String::as_str)) {
            return Err(EncoderError::ColumnMismatch {
                expected: self.names_in.clone(),
                found: block.column_names().map(str::to_string).collect(),
            });
        }

        let mut encoded = Vec::with_capacity(self.output_width());
        for (column, (_, value)) in self.columns.iter().zip(&block.values) {
            for category in &column.categories {
                let indicator = if category == value { 1.0 } else { 0.0 };
                encoded.push((format!("{}_{}", column.name, category), indicator));
            }
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> OneHotEncoder {
        OneHotEncoder::from_json_str(
            r#"{"columns": [
                {"name": "preferred_cuisine", "categories": ["Multi", "North Indian", "South Indian"]},
                {"name": "loyalty_tier", "categories": ["Gold", "Unknown"]}
            ]}"#,
            "inline",
        )
        .unwrap()
    }

    fn block(cuisine: &str, tier: &str) -> CategoricalBlock {
        CategoricalBlock {
            values: vec![
                ("preferred_cuisine".to_string(), cuisine.to_string()),
                ("loyalty_tier".to_string(), tier.to_string()),
            ],
        }
    }

    #[test]
    fn test_feature_names_out() {
        assert_eq!(
            encoder().feature_names_out(),
            vec![
                "preferred_cuisine_Multi",
                "preferred_cuisine_North Indian",
                "preferred_cuisine_South Indian",
                "loyalty_tier_Gold",
                "loyalty_tier_Unknown",
            ]
        );
    }

    #[test]
    fn test_transform_known_categories() {
        let values: Vec<f64> = encoder()
            .transform(&block("South Indian", "Gold"))
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_encodes_to_zeros() {
        let encoded = encoder().transform(&block("Continental", "Unknown")).unwrap();

        let cuisine: Vec<f64> = encoded
            .iter()
            .filter(|(name, _)| name.starts_with("preferred_cuisine_"))
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(cuisine, vec![0.0, 0.0, 0.0]);
        // The sentinel is an ordinary category when it was seen at fit time
        assert_eq!(encoded[4], ("loyalty_tier_Unknown".to_string(), 1.0));
    }

    #[test]
    fn test_column_mismatch_is_rejected() {
        let swapped = CategoricalBlock {
            values: vec![
                ("loyalty_tier".to_string(), "Gold".to_string()),
                ("preferred_cuisine".to_string(), "Multi".to_string()),
            ],
        };
        assert!(matches!(
            encoder().transform(&swapped),
            Err(EncoderError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_artifacts() {
        assert!(matches!(
            OneHotEncoder::from_json_str("{\"columns\": 3}", "inline"),
            Err(EncoderError::Malformed { .. })
        ));
        assert!(matches!(
            OneHotEncoder::from_json_str(
                r#"{"columns": [{"name": "a", "categories": ["x", "x"]}]}"#,
                "inline"
            ),
            Err(EncoderError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoder.json");
        std::fs::write(&path, r#"{"columns": [{"name": "age", "categories": ["29"]}]}"#).unwrap();

        let encoder = OneHotEncoder::from_path(&path).unwrap();
        assert_eq!(encoder.feature_names_in(), &["age".to_string()]);
        assert!(matches!(
            OneHotEncoder::from_path(&dir.path().join("missing.json")),
            Err(EncoderError::Unreadable { .. })
        ));
    }
}
