//! End-to-end tests against the sample artifact set shipped in `artifacts/`.
//!
//! Failure cases run on a copy of that directory with one artifact broken.

use anyhow::Result;
use feature_store::{BookingForm, BookingRequest, Cuisine};
use recommender::{ArtifactBundle, ArtifactConfig, DishRecommender, RecommendError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn sample_artifacts() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../artifacts")
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn load(dir: &Path) -> recommender::Result<DishRecommender> {
    let config = ArtifactConfig::from_dir(dir)?;
    Ok(DishRecommender::new(Arc::new(ArtifactBundle::load(&config)?)))
}

fn booking(customer_id: i64, cuisine: &str, age: u32, check_in: &str, check_out: &str) -> BookingRequest {
    BookingRequest::new(BookingForm {
        customer_id,
        preferred_cuisine: cuisine.parse::<Cuisine>().unwrap(),
        age,
        check_in_date: check_in.parse().unwrap(),
        check_out_date: check_out.parse().unwrap(),
        booked_through_points: false,
        number_of_stayers: 2,
    })
    .unwrap()
}

#[test]
fn test_recommend_from_sample_artifacts() -> Result<()> {
    let recommender = load(&sample_artifacts())?;
    let booking = booking(12345, "South Indian", 29, "2026-10-20", "2026-10-23");

    let predictions = recommender.recommend(&booking)?;
    let names: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(names, vec!["Masala Dosa", "Idli", "Veg Biryani"]);

    let total: f64 = predictions.iter().map(|p| p.probability).sum();
    assert!(total <= 1.0 + 1e-9);
    assert!(
        predictions
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability)
    );

    let all = recommender.distribution(&booking)?;
    assert_eq!(all.len(), 5);
    assert!((all.iter().map(|p| p.probability).sum::<f64>() - 1.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_composed_numerics_are_not_classifier_inputs() -> Result<()> {
    let recommender = load(&sample_artifacts())?;
    let booking = booking(12345, "South Indian", 29, "2026-10-20", "2026-10-23");

    let composed = recommender.bundle().composer().compose(&booking);
    assert_eq!(
        composed.row.get("total_orders").and_then(|v| v.as_number()),
        Some(14.0)
    );

    let vector = recommender.feature_vector(&booking)?;
    for column in ["age", "stay_duration", "total_orders", "age_avg_spend"] {
        assert_eq!(vector.get(column), Some(0.0), "{column}");
    }
    assert_eq!(vector.get("customer_favourite_dish_Masala Dosa"), Some(1.0));
    assert_eq!(vector.get("age_top_dish_Masala Dosa"), Some(1.0));
    Ok(())
}

#[test]
fn test_unknown_customer_and_cuisine_complete() -> Result<()> {
    let recommender = load(&sample_artifacts())?;
    let booking = booking(99999, "Continental", 77, "2026-10-20", "2026-10-22");

    let vector = recommender.feature_vector(&booking)?;
    assert_eq!(vector.get("total_orders"), Some(0.0));
    assert_eq!(vector.get("customer_favourite_dish_Masala Dosa"), Some(0.0));
    assert_eq!(vector.get("loyalty_tier_Unknown"), Some(1.0));
    assert_eq!(vector.get("preferred_cuisine_Multi"), Some(0.0));
    assert_eq!(vector.get("preferred_cuisine_North Indian"), Some(0.0));
    assert_eq!(vector.get("preferred_cuisine_South Indian"), Some(0.0));

    assert_eq!(recommender.recommend(&booking)?.len(), 3);
    Ok(())
}

#[test]
fn test_inverted_dates_still_recommend() -> Result<()> {
    let recommender = load(&sample_artifacts())?;
    let booking = booking(48822, "Multi", 41, "2026-11-03", "2026-10-30");

    assert!(booking.stay().stay_duration < 0);
    let vector = recommender.feature_vector(&booking)?;
    assert_eq!(vector.len(), recommender.bundle().aligner().expected().len());
    assert_eq!(recommender.recommend(&booking)?.len(), 3);
    Ok(())
}

#[test]
fn test_missing_feature_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    copy_dir(&sample_artifacts(), dir.path())?;
    fs::remove_file(dir.path().join("features/loyalty_features.csv"))?;

    match load(dir.path()) {
        Err(RecommendError::FeatureTableUnavailable { table, .. }) => {
            assert_eq!(table, "loyalty_features")
        }
        other => panic!("expected FeatureTableUnavailable, got {:?}", other.err()),
    }
    Ok(())
}

#[test]
fn test_missing_schema_and_model_artifacts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    copy_dir(&sample_artifacts(), dir.path())?;

    fs::remove_file(dir.path().join("encoder.json"))?;
    assert!(matches!(
        load(dir.path()),
        Err(RecommendError::SchemaArtifactMissing { .. })
    ));

    copy_dir(&sample_artifacts(), dir.path())?;
    fs::write(dir.path().join("model.json"), "{ not json")?;
    assert!(matches!(
        load(dir.path()),
        Err(RecommendError::ModelArtifactMissing { .. })
    ));
    Ok(())
}

#[test]
fn test_manifest_points_at_alternate_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    copy_dir(&sample_artifacts(), dir.path())?;
    fs::create_dir_all(dir.path().join("v2"))?;
    fs::rename(dir.path().join("model.json"), dir.path().join("v2/model.json"))?;
    fs::write(
        dir.path().join(recommender::MANIFEST_FILE),
        r#"{"model": "v2/model.json"}"#,
    )?;

    let recommender = load(dir.path())?;
    assert_eq!(recommender.bundle().labels().len(), 5);
    Ok(())
}
