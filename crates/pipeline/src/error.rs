//! Error types for the categorical encoder.

use thiserror::Error;

/// Errors raised while loading or applying a fitted encoder
#[derive(Error, Debug)]
pub enum EncoderError {
    /// Encoder artifact could not be read
    #[error("Failed to read encoder artifact {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoder artifact is not valid JSON of the expected shape
    #[error("Malformed encoder artifact {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact parsed but describes an impossible encoder
    #[error("Invalid encoder artifact: {0}")]
    Invalid(String),

    /// The block handed to `transform` doesn't carry the trained columns
    #[error("Encoder expected columns {expected:?} but received {found:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Convenience type alias for encoder Results
pub type Result<T> = std::result::Result<T, EncoderError>;
