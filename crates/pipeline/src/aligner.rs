//! Schema alignment.
//!
//! A composed row carries whatever columns the joins produced. The fitted
//! encoder and classifier each expect an exact column set, so alignment runs
//! in two steps around the encoder:
//!
//! 1. `align_categorical`: exactly the encoder's columns, in its order, with
//!    `"Unknown"` for anything the row lacks. Every other composed column is
//!    dropped here, numeric or not.
//! 2. `align_features`: exactly the expected feature list, in its order.
//!    Categorical slots take the encoder's output; numeric slots and any
//!    missing indicator are `0.0`; extras are dropped.

use crate::schema::{ColumnKind, SchemaDescriptor};
use feature_store::{FeatureRow, FeatureValue};
use std::collections::HashMap;
use tracing::debug;

/// Category used for encoder columns the composed row doesn't carry
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Encoder input: one category string per trained column, in trained order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalBlock {
    pub values: Vec<(String, String)>,
}

impl CategoricalBlock {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

/// The classifier input: values in expected-feature order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn get(&self, column: &str) -> Option<f64> {
        let pos = self.columns.iter().position(|c| c == column)?;
        Some(self.values[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reconciles runtime rows with the column sets recorded at training time
#[derive(Debug, Clone)]
pub struct SchemaAligner {
    encoder_schema: Vec<String>,
    expected: SchemaDescriptor,
}

impl SchemaAligner {
    /// # Arguments
    /// * `encoder_schema` - Categorical columns of the fitted encoder, in order
    /// * `expected` - The classifier's full input schema, in order
    pub fn new(encoder_schema: Vec<String>, expected: SchemaDescriptor) -> Self {
        Self {
            encoder_schema,
            expected,
        }
    }

    pub fn encoder_schema(&self) -> &[String] {
        &self.encoder_schema
    }

    pub fn expected(&self) -> &SchemaDescriptor {
        &self.expected
    }

    /// Step 1: restrict the row to the encoder's columns.
    pub fn align_categorical(&self, row: &FeatureRow) -> CategoricalBlock {
        let values: Vec<(String, String)> = self
            .encoder_schema
            .iter()
            .map(|column| {
                let category = row
                    .get(column)
                    .map(FeatureValue::to_string)
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
                (column.clone(), category)
            })
            .collect();

        let filled = self
            .encoder_schema
            .iter()
            .filter(|c| !row.contains(c))
            .count();
        let dropped = row
            .column_names()
            .filter(|name| !self.encoder_schema.iter().any(|c| c.as_str() == *name))
            .count();
        debug!(
            "Categorical alignment: {} columns ({} filled with {:?}), {} other columns dropped",
            values.len(),
            filled,
            UNKNOWN_CATEGORY,
            dropped
        );

        CategoricalBlock { values }
    }

    /// Step 2: lay the encoder output out exactly as the classifier expects.
    ///
    /// Only categorical slots are read from `encoded`; the first occurrence
    /// of a name wins. Numeric slots have no source after step 1 and are
    /// always `0.0`. Running this on an already aligned vector returns it
    /// unchanged.
    pub fn align_features<'a>(
        &self,
        encoded: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> FeatureVector {
        let mut available: HashMap<&str, f64> = HashMap::new();
        for (name, value) in encoded {
            available.entry(name).or_insert(value);
        }

        let mut zero_filled = 0usize;
        let (columns, values): (Vec<String>, Vec<f64>) = self
            .expected
            .columns()
            .iter()
            .map(|spec| {
                let value = match spec.kind {
                    ColumnKind::Categorical => available.get(spec.name.as_str()).copied(),
                    ColumnKind::Numeric => None,
                };
                if value.is_none() {
                    zero_filled += 1;
                }
                (spec.name.clone(), value.unwrap_or(0.0))
            })
            .unzip();

        let extra = self.expected.diff(available.keys().copied()).extra.len();
        debug!(
            "Feature alignment: {} columns, {} filled with 0, {} extra columns dropped",
            columns.len(),
            zero_filled,
            extra
        );

        FeatureVector { columns, values }
    }
}
