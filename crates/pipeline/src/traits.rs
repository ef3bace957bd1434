//! Core traits for the feature pipeline.
//!
//! The fitted encoder is an artifact produced elsewhere; this trait is the
//! seam that lets the recommender run against the real encoder or a fake.

use crate::aligner::CategoricalBlock;
use crate::error::Result;

/// A fitted categorical encoder.
///
/// ## Design Note
/// - `Send + Sync` so one encoder can be shared by concurrent requests
/// - Implementations are read-only after loading
pub trait CategoricalEncoder: Send + Sync {
    /// Categorical columns captured at fit time, in order
    fn feature_names_in(&self) -> &[String];

    /// Names of the numeric columns `transform` produces, in order
    fn feature_names_out(&self) -> Vec<String>;

    /// Encode one aligned categorical block.
    ///
    /// # Returns
    /// * `Ok(Vec<(name, value)>)` - one entry per output column, in `feature_names_out` order
    /// * `Err` - if the block's columns differ from `feature_names_in`
    ///
    /// Categories never seen at fit time must encode to zeros, not fail.
    fn transform(&self, block: &CategoricalBlock) -> Result<Vec<(String, f64)>>;
}
