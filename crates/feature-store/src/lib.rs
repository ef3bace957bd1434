//! # Feature Store Crate
//!
//! This crate holds the booking model and the static feature tables the
//! dish recommender joins bookings against.
//!
//! ## Main Components
//!
//! - **types**: Booking types, feature values/rows, `JoinKey`, `FeatureTable`, `FeatureStore`
//! - **parser**: Parse comma separated table exports into `FeatureTable`s
//! - **index**: Load the declared set of tables from a directory
//! - **error**: Error types for table loading and booking validation
//!
//! ## Example Usage
//!
//! ```ignore
//! use feature_store::{BookingForm, BookingRequest, Cuisine, FeatureStore};
//! use std::path::Path;
//!
//! // Load every feature table once at startup
//! let store = FeatureStore::load_from_dir(Path::new("artifacts/features"))?;
//!
//! let booking = BookingRequest::new(BookingForm {
//!     customer_id: 12345,
//!     preferred_cuisine: Cuisine::SouthIndian,
//!     age: 29,
//!     check_in_date: "2026-10-20".parse()?,
//!     check_out_date: "2026-10-23".parse()?,
//!     booked_through_points: false,
//!     number_of_stayers: 2,
//! })?;
//!
//! println!("Stay of {} nights", booking.stay().stay_duration);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{BookingError, FeatureStoreError, Result};
pub use types::{
    // Type aliases and constants
    CustomerId,
    FEATURE_TABLES,
    // Booking types
    BookingForm,
    BookingRequest,
    Cuisine,
    StayFeatures,
    // Feature tables
    FeatureRow,
    FeatureStore,
    FeatureTable,
    FeatureValue,
    JoinKey,
    canonical_number,
};
