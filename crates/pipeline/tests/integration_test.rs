//! Integration tests for the pipeline.
//!
//! These tests verify that composition, alignment and encoding work together
//! on tables loaded from disk.

use feature_store::{BookingForm, BookingRequest, Cuisine, FeatureStore};
use pipeline::{
    CategoricalEncoder, ColumnKind, FeatureComposer, FeatureVector, OneHotEncoder, SchemaAligner,
    SchemaDescriptor, UNKNOWN_CATEGORY,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const TABLES: [&str; 3] = ["age_features", "customer_features", "loyalty_features"];

fn create_test_setup(dir: &Path) -> (FeatureComposer, OneHotEncoder, SchemaAligner) {
    fs::write(
        dir.join("age_features.csv"),
        "age,age_band,avg_spend\n29,20s,410.5\n41,40s,520\n",
    )
    .unwrap();
    fs::write(
        dir.join("customer_features.csv"),
        "customer_id,visits,favourite_dish\n12345,4,Masala Dosa\n",
    )
    .unwrap();
    fs::write(
        dir.join("loyalty_features.csv"),
        "customer_id,loyalty_tier\n99,Gold\n",
    )
    .unwrap();

    let store = FeatureStore::load_tables(dir, &TABLES).unwrap();
    let composer = FeatureComposer::new(Arc::new(store));

    let encoder = OneHotEncoder::from_json_str(
        r#"{"columns": [
            {"name": "preferred_cuisine", "categories": ["Multi", "North Indian", "South Indian"]},
            {"name": "age_band", "categories": ["20s", "40s"]},
            {"name": "loyalty_tier", "categories": ["Gold", "Unknown"]}
        ]}"#,
        "test",
    )
    .unwrap();

    let expected: Vec<String> = [
        "age",
        "stay_duration",
        "visits",
        "avg_spend",
        "recency_days",
        "preferred_cuisine_Multi",
        "preferred_cuisine_North Indian",
        "preferred_cuisine_South Indian",
        "age_band_20s",
        "age_band_40s",
        "loyalty_tier_Gold",
        "loyalty_tier_Unknown",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let schema = SchemaDescriptor::from_expected_features(&expected, &encoder.feature_names_out());
    let aligner = SchemaAligner::new(encoder.feature_names_in().to_vec(), schema);

    (composer, encoder, aligner)
}

fn booking(customer_id: i64, cuisine: &str, age: u32) -> BookingRequest {
    BookingRequest::new(BookingForm {
        customer_id,
        preferred_cuisine: cuisine.parse::<Cuisine>().unwrap(),
        age,
        check_in_date: "2026-10-20".parse().unwrap(),
        check_out_date: "2026-10-24".parse().unwrap(),
        booked_through_points: true,
        number_of_stayers: 2,
    })
    .unwrap()
}

fn run(
    composer: &FeatureComposer,
    encoder: &OneHotEncoder,
    aligner: &SchemaAligner,
    booking: &BookingRequest,
) -> FeatureVector {
    let composed = composer.compose(booking);
    let block = aligner.align_categorical(&composed.row);
    let encoded = encoder.transform(&block).unwrap();
    aligner.align_features(encoded.iter().map(|(n, v)| (n.as_str(), *v)))
}

#[test]
fn test_full_pipeline_for_known_customer() {
    let dir = tempfile::tempdir().unwrap();
    let (composer, encoder, aligner) = create_test_setup(dir.path());

    let booking = booking(12345, "South Indian", 29);
    let composed = composer.compose(&booking);
    assert_eq!(
        composed.row.get("visits").and_then(|v| v.as_number()),
        Some(4.0)
    );

    let vector = run(&composer, &encoder, &aligner, &booking);

    assert_eq!(vector.len(), aligner.expected().len());
    assert_eq!(vector.get("preferred_cuisine_South Indian"), Some(1.0));
    assert_eq!(vector.get("age_band_20s"), Some(1.0));
    // No loyalty row: the sentinel category is what gets encoded
    assert_eq!(vector.get("loyalty_tier_Unknown"), Some(1.0));
    // Composed numerics never reach the classifier
    for column in ["age", "stay_duration", "visits", "avg_spend", "recency_days"] {
        assert_eq!(vector.get(column), Some(0.0), "{column}");
    }
}

#[test]
fn test_unmatched_customer_gets_sentinels_and_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let (composer, encoder, aligner) = create_test_setup(dir.path());
    let unknown = booking(55555, "Multi", 77);

    let composed = composer.compose(&unknown);
    assert_eq!(composed.matched_tables().count(), 0);

    let block = aligner.align_categorical(&composed.row);
    assert_eq!(block.get("age_band"), Some(UNKNOWN_CATEGORY));
    assert_eq!(block.get("loyalty_tier"), Some(UNKNOWN_CATEGORY));

    let vector = run(&composer, &encoder, &aligner, &unknown);
    assert_eq!(vector.get("visits"), Some(0.0));
    assert_eq!(vector.get("avg_spend"), Some(0.0));
    assert_eq!(vector.get("age_band_20s"), Some(0.0));
    assert_eq!(vector.get("age_band_40s"), Some(0.0));
}

#[test]
fn test_unseen_cuisine_zeroes_its_indicators() {
    let dir = tempfile::tempdir().unwrap();
    let (composer, encoder, aligner) = create_test_setup(dir.path());

    let vector = run(&composer, &encoder, &aligner, &booking(12345, "Continental", 29));

    let cuisine_total: f64 = vector
        .iter()
        .filter(|(name, _)| name.starts_with("preferred_cuisine_"))
        .map(|(_, v)| v)
        .sum();
    assert_eq!(cuisine_total, 0.0);
}

#[test]
fn test_alignment_is_a_fixed_point() {
    let dir = tempfile::tempdir().unwrap();
    let (composer, encoder, aligner) = create_test_setup(dir.path());

    let vector = run(&composer, &encoder, &aligner, &booking(12345, "North Indian", 41));
    let realigned = aligner.align_features(vector.iter());

    assert_eq!(vector, realigned);
    assert_eq!(aligner.expected().count_kind(ColumnKind::Categorical), 7);
}
