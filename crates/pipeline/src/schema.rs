//! Ordered schema descriptors.
//!
//! The classifier's input contract is an exact, ordered list of columns.
//! `SchemaDescriptor` records that list together with each column's kind so
//! alignment can compare two known lists instead of probing row contents.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a column reaches the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Produced by the categorical encoder
    Categorical,
    /// Passed through from the composed row
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Columns present on one side of a comparison but not the other
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Declared in the schema, absent from the row
    pub missing: Vec<String>,
    /// Present in the row, not declared in the schema
    pub extra: Vec<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// An ordered list of named, typed columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    columns: Vec<ColumnSpec>,
}

impl SchemaDescriptor {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Describe the expected feature list, marking every encoder output as
    /// categorical and everything else as numeric.
    pub fn from_expected_features(expected: &[String], encoded: &[String]) -> Self {
        let encoded: HashSet<&str> = encoded.iter().map(String::as_str).collect();
        let columns = expected
            .iter()
            .map(|name| ColumnSpec {
                name: name.clone(),
                kind: if encoded.contains(name.as_str()) {
                    ColumnKind::Categorical
                } else {
                    ColumnKind::Numeric
                },
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn count_kind(&self, kind: ColumnKind) -> usize {
        self.columns.iter().filter(|c| c.kind == kind).count()
    }

    /// Compare the declared columns against the names a row carries
    pub fn diff<'a>(&self, present: impl IntoIterator<Item = &'a str>) -> SchemaDiff {
        let present: Vec<&str> = present.into_iter().collect();
        let present_set: HashSet<&str> = present.iter().copied().collect();
        let declared: HashSet<&str> = self.names().collect();

        SchemaDiff {
            missing: self
                .names()
                .filter(|name| !present_set.contains(name))
                .map(str::to_string)
                .collect(),
            extra: present
                .into_iter()
                .filter(|name| !declared.contains(name))
                .map(str::to_string)
                .collect(),
        }
    }
}
