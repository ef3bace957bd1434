//! Example: load the feature tables and print a summary
//!
//! Run with: cargo run --package feature-store --example load_tables -- artifacts/features

use feature_store::FeatureStore;
use std::path::PathBuf;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts/features"));

    println!("Loading feature tables from {}...\n", dir.display());

    let start = Instant::now();
    let store = FeatureStore::load_from_dir(&dir)?;
    let elapsed = start.elapsed();

    let (tables, rows) = store.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Tables: {}", tables);
    println!("Rows: {}", rows);
    for table in store.tables() {
        let key = table
            .join_key()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        println!(
            "  {:<30} key={:<18} rows={:<6} features={}",
            table.name(),
            key,
            table.row_count(),
            table.feature_columns().count()
        );
    }
    Ok(())
}
