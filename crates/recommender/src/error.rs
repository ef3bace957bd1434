//! Error taxonomy of the recommendation core.
//!
//! Every variant is fatal for the request that hit it: the causes are
//! missing or inconsistent static artifacts, so nothing is retried and no
//! partial recommendation is returned.

use feature_store::FeatureStoreError;
use inference::ModelError;
use pipeline::EncoderError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// A declared feature table could not be loaded
    #[error("Feature table {table} is unavailable: {source}")]
    FeatureTableUnavailable {
        table: String,
        #[source]
        source: FeatureStoreError,
    },

    /// The encoder or the expected feature list could not be loaded
    #[error("Schema artifact {artifact} is missing or unreadable: {source}")]
    SchemaArtifactMissing {
        artifact: String,
        #[source]
        source: BoxError,
    },

    /// The classifier or the label decoder could not be loaded
    #[error("Model artifact {artifact} is missing or unreadable: {source}")]
    ModelArtifactMissing {
        artifact: String,
        #[source]
        source: ModelError,
    },

    /// Artifacts loaded fine but disagree with each other
    #[error("Artifacts are incompatible: {0}")]
    IncompatibleArtifacts(String),

    /// The artifact manifest could not be read
    #[error("Invalid artifact configuration {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncoderError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ModelError),
}

impl From<FeatureStoreError> for RecommendError {
    fn from(source: FeatureStoreError) -> Self {
        RecommendError::FeatureTableUnavailable {
            table: source.table().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
