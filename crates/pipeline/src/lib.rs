//! Feature composition, schema alignment and categorical encoding.
//!
//! This crate provides:
//! - FeatureComposer for joining a booking against the feature tables
//! - SchemaAligner and SchemaDescriptor for matching the trained column layout
//! - CategoricalEncoder trait and the OneHotEncoder implementation
//!
//! ## Architecture
//! A booking moves through the stages in order:
//! 1. FeatureComposer builds one wide row from the booking and every table
//! 2. SchemaAligner restricts the row to the encoder's categorical block
//! 3. The encoder turns that block into indicator columns
//! 4. SchemaAligner lays the indicators out in the classifier's column order,
//!    zero-filling every other slot
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{CategoricalEncoder, FeatureComposer, OneHotEncoder, SchemaAligner, SchemaDescriptor};
//!
//! let composer = FeatureComposer::new(store.clone());
//! let encoder = OneHotEncoder::from_path(Path::new("artifacts/encoder.json"))?;
//! let expected = SchemaDescriptor::from_expected_features(&features, &encoder.feature_names_out());
//! let aligner = SchemaAligner::new(encoder.feature_names_in().to_vec(), expected);
//!
//! let composed = composer.compose(&booking);
//! let block = aligner.align_categorical(&composed.row);
//! let encoded = encoder.transform(&block)?;
//! let vector = aligner.align_features(encoded.iter().map(|(n, v)| (n.as_str(), *v)));
//! ```

pub mod error;
pub mod traits;
pub mod schema;
pub mod composer;
pub mod aligner;
pub mod encoder;

// Re-export main types
pub use error::EncoderError;
pub use traits::CategoricalEncoder;
pub use schema::{ColumnKind, ColumnSpec, SchemaDescriptor, SchemaDiff};
pub use composer::{ComposedRow, FeatureComposer, JoinOutcome};
pub use aligner::{CategoricalBlock, FeatureVector, SchemaAligner, UNKNOWN_CATEGORY};
pub use encoder::{EncodedColumn, OneHotEncoder};
