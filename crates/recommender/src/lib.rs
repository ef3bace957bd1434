//! Recommendation core for the dish recommender.
//!
//! This crate ties the feature store, the pipeline and the inference
//! artifacts together:
//! - `ArtifactConfig` / `ArtifactBundle`: locate and load everything once
//! - `DishRecommender`: booking in, ranked dishes out
//! - `ranker`: top-K selection over a class distribution
//!
//! ## Example Usage
//! ```ignore
//! use recommender::{ArtifactBundle, ArtifactConfig, DishRecommender};
//!
//! let config = ArtifactConfig::from_dir(Path::new("artifacts"))?;
//! let recommender = DishRecommender::new(Arc::new(ArtifactBundle::load(&config)?));
//! for dish in recommender.recommend(&booking)? {
//!     println!("{} ({:.3})", dish.label, dish.probability);
//! }
//! ```

pub mod artifacts;
pub mod error;
pub mod orchestrator;
pub mod ranker;

pub use artifacts::{ArtifactBundle, ArtifactConfig, MANIFEST_FILE, load_expected_features};
pub use error::{RecommendError, Result};
pub use orchestrator::DishRecommender;
pub use ranker::{DEFAULT_TOP_K, Prediction, rank_top_k};
