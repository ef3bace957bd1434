//! # Recommendation Orchestrator
//!
//! This module runs one booking through the whole pipeline:
//! 1. Derive the booking's own features (done by `BookingRequest`)
//! 2. Compose the wide row from the feature tables
//! 3. Restrict the row to the encoder schema's categorical block
//! 4. One-hot encode it
//! 5. Align the encoder output to the classifier's feature list
//! 6. Score with the classifier
//! 7. Rank and return the top K dishes
//!
//! A request is synchronous and touches nothing but the shared, read-only
//! `ArtifactBundle`, so one recommender can be cloned across threads.

use std::sync::Arc;
use std::time::Instant;

use feature_store::BookingRequest;
use pipeline::FeatureVector;
use tracing::{debug, info};

use crate::artifacts::ArtifactBundle;
use crate::error::{RecommendError, Result};
use crate::ranker::{self, DEFAULT_TOP_K, Prediction};

/// Dish recommender over a loaded artifact bundle
#[derive(Clone)]
pub struct DishRecommender {
    bundle: Arc<ArtifactBundle>,
    top_k: usize,
}

impl DishRecommender {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self {
            bundle,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Return `k` dishes per request instead of the default
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Main entry point: the top K dishes for a booking, most probable first
    pub fn recommend(&self, booking: &BookingRequest) -> Result<Vec<Prediction>> {
        let start_time = Instant::now();

        let probabilities = self.score(booking)?;
        let predictions = ranker::rank_top_k(&probabilities, self.bundle.labels(), self.top_k);
        debug!(
            "Ranked {} classes, returning top {}",
            probabilities.len(),
            predictions.len()
        );

        info!(
            "Recommended {} dishes for customer {} in {:.2?}",
            predictions.len(),
            booking.customer_id(),
            start_time.elapsed()
        );
        Ok(predictions)
    }

    /// Every dish with its probability, in class-index order
    pub fn distribution(&self, booking: &BookingRequest) -> Result<Vec<Prediction>> {
        let probabilities = self.score(booking)?;
        Ok(ranker::distribution(&probabilities, self.bundle.labels()))
    }

    /// Stages 2 to 5: the classifier input for a booking
    pub fn feature_vector(&self, booking: &BookingRequest) -> Result<FeatureVector> {
        let composed = self.bundle.composer().compose(booking);
        debug!(
            "Composed {} columns; matched tables: {:?}",
            composed.row.len(),
            composed.matched_tables().collect::<Vec<_>>()
        );

        let aligner = self.bundle.aligner();
        let block = aligner.align_categorical(&composed.row);

        let encoded = self.bundle.encoder().transform(&block)?;
        debug!("Encoded {} categorical indicator columns", encoded.len());

        let vector =
            aligner.align_features(encoded.iter().map(|(name, value)| (name.as_str(), *value)));
        debug!("Aligned feature vector with {} columns", vector.len());
        Ok(vector)
    }

    /// Stage 6: class probabilities for a booking
    fn score(&self, booking: &BookingRequest) -> Result<Vec<f64>> {
        let vector = self.feature_vector(booking)?;
        let probabilities = self.bundle.classifier().predict_proba(&vector.values)?;

        let classes = self.bundle.labels().len();
        if probabilities.len() != classes {
            return Err(RecommendError::IncompatibleArtifacts(format!(
                "classifier returned {} probabilities for {} labels",
                probabilities.len(),
                classes
            )));
        }
        debug!("Scored {} classes", probabilities.len());
        Ok(probabilities)
    }
}
