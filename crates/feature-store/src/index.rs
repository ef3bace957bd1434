//! FeatureStore loading logic.
//!
//! Reads every declared feature table from a directory:
//! - Parse all table files in parallel with Rayon
//! - Register them in declaration order (the order joins happen in)
//! - Fail the whole load if any single table is unavailable

use crate::error::Result;
use crate::parser;
use crate::types::{FEATURE_TABLES, FeatureStore};
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

impl FeatureStore {
    /// Load the standard set of feature tables from `<dir>/<table>.csv`
    ///
    /// This is the main entry point used at process start.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_tables(dir, &FEATURE_TABLES)
    }

    /// Load an explicit list of tables from `<dir>/<table>.csv`
    ///
    /// Steps:
    /// 1. Parse every table file in parallel
    /// 2. Stop at the first table that could not be loaded
    /// 3. Register the tables in the order they were declared
    pub fn load_tables(dir: &Path, names: &[&str]) -> Result<Self> {
        info!("Loading {} feature tables from {:?}", names.len(), dir);

        // Indexed parallel iterators keep input order when collected
        let tables = names
            .par_iter()
            .map(|name| parser::parse_table(name, &dir.join(format!("{name}.csv"))))
            .collect::<Result<Vec<_>>>()?;

        let mut store = FeatureStore::new();
        for table in tables {
            store.insert_table(table);
        }

        let (table_count, row_count) = store.counts();
        info!(
            "Loaded {} feature tables with {} rows in total",
            table_count, row_count
        );
        Ok(store)
    }
}
