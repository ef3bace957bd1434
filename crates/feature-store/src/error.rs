//! Error types for the feature-store crate.
//!
//! Two families live here:
//! - `FeatureStoreError` for anything that goes wrong while reading feature tables
//! - `BookingError` for booking form values outside their accepted ranges

use thiserror::Error;

/// Errors that can occur while loading and parsing feature tables
///
/// Every variant carries the table name so the caller can report
/// exactly which artifact is unavailable.
#[derive(Error, Debug)]
pub enum FeatureStoreError {
    /// Table file could not be found or opened
    #[error("Failed to open feature table {table}: {path}")]
    FileNotFound { table: String, path: String },

    /// I/O error occurred while reading a table file
    #[error("I/O error reading feature table {table}: {source}")]
    Io {
        table: String,
        #[source]
        source: std::io::Error,
    },

    /// A line in the table couldn't be parsed
    #[error("Parse error at line {line} in {table}: {reason}")]
    ParseError {
        table: String,
        line: usize,
        reason: String,
    },

    /// Row width doesn't match the header
    #[error("Expected {expected} fields but found {found} in line {line} of {table}")]
    FieldCountMismatch {
        table: String,
        expected: usize,
        found: usize,
        line: usize,
    },

    /// File exists but has no header row
    #[error("Feature table {table} is empty")]
    EmptyTable { table: String },
}

impl FeatureStoreError {
    /// Name of the table this error refers to
    pub fn table(&self) -> &str {
        match self {
            Self::FileNotFound { table, .. }
            | Self::Io { table, .. }
            | Self::ParseError { table, .. }
            | Self::FieldCountMismatch { table, .. }
            | Self::EmptyTable { table } => table,
        }
    }
}

/// Booking fields rejected at construction time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Age {0} is outside the accepted range 18..=120")]
    AgeOutOfRange(u32),

    #[error("Number of stayers {0} is outside the accepted range 1..=3")]
    StayersOutOfRange(u32),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, FeatureStoreError>;
