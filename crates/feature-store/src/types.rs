//! Core domain types for bookings and feature tables.
//!
//! This module defines the data structures shared by every stage of the
//! recommendation pipeline:
//! - `BookingRequest` with its derived stay features
//! - `FeatureValue` / `FeatureRow` for loosely typed table cells
//! - `JoinKey` and `FeatureTable` for static lookup tables
//! - `FeatureStore`, the in-memory registry of all loaded tables

use crate::error::BookingError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

// =============================================================================
// Column names
// =============================================================================

pub const CUSTOMER_ID: &str = "customer_id";
pub const PREFERRED_CUISINE: &str = "preferred_cuisine";
pub const AGE: &str = "age";
pub const NUMBER_OF_STAYERS: &str = "number_of_stayers";
pub const BOOKED_THROUGH_POINTS: &str = "booked_through_points";
pub const CHECK_IN_DATE: &str = "check_in_date";
pub const CHECK_OUT_DATE: &str = "check_out_date";
pub const CHECK_IN_DAY: &str = "check_in_day";
pub const CHECK_OUT_DAY: &str = "check_out_day";
pub const CHECK_IN_MONTH: &str = "check_in_month";
pub const CHECK_OUT_MONTH: &str = "check_out_month";
pub const STAY_DURATION: &str = "stay_duration";

/// The feature tables every deployment ships, in join order
pub const FEATURE_TABLES: [&str; 7] = [
    "age_features",
    "cuisine_features",
    "customer_features",
    "customer_behaviour_features",
    "customer_recency_features",
    "loyalty_features",
    "stayed_features",
];

/// Unique identifier for a hotel guest
pub type CustomerId = i64;

// =============================================================================
// Booking Types
// =============================================================================

/// Cuisine preference picked on the booking form
///
/// Strings that don't name a known cuisine are kept verbatim in `Other`
/// so they reach the encoder, which maps them to an all-zero indicator group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cuisine {
    SouthIndian,
    NorthIndian,
    Multi,
    Other(String),
}

impl Cuisine {
    pub fn as_str(&self) -> &str {
        match self {
            Cuisine::SouthIndian => "South Indian",
            Cuisine::NorthIndian => "North Indian",
            Cuisine::Multi => "Multi",
            Cuisine::Other(name) => name,
        }
    }
}

impl FromStr for Cuisine {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "South Indian" => Cuisine::SouthIndian,
            "North Indian" => Cuisine::NorthIndian,
            "Multi" => Cuisine::Multi,
            other => Cuisine::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw booking fields as submitted on the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingForm {
    pub customer_id: CustomerId,
    pub preferred_cuisine: Cuisine,
    pub age: u32,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub booked_through_points: bool,
    pub number_of_stayers: u32,
}

/// Calendar features derived from the stay dates
///
/// Weekdays count from Monday = 0. `stay_duration` is signed: an inverted
/// date range yields a negative duration and is passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayFeatures {
    pub check_in_day: u32,
    pub check_out_day: u32,
    pub check_in_month: u32,
    pub check_out_month: u32,
    pub stay_duration: i64,
}

impl StayFeatures {
    pub fn from_dates(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in_day: check_in.weekday().num_days_from_monday(),
            check_out_day: check_out.weekday().num_days_from_monday(),
            check_in_month: check_in.month(),
            check_out_month: check_out.month(),
            stay_duration: (check_out - check_in).num_days(),
        }
    }
}

/// A validated booking with its derived features computed once.
///
/// Fields are private so the derived features can never drift from the
/// dates they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRequest {
    form: BookingForm,
    stay: StayFeatures,
}

impl BookingRequest {
    /// Validate the form ranges and derive the stay features
    pub fn new(form: BookingForm) -> Result<Self, BookingError> {
        if !(18..=120).contains(&form.age) {
            return Err(BookingError::AgeOutOfRange(form.age));
        }
        if !(1..=3).contains(&form.number_of_stayers) {
            return Err(BookingError::StayersOutOfRange(form.number_of_stayers));
        }
        let stay = StayFeatures::from_dates(form.check_in_date, form.check_out_date);
        Ok(Self { form, stay })
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn stay(&self) -> &StayFeatures {
        &self.stay
    }

    pub fn customer_id(&self) -> CustomerId {
        self.form.customer_id
    }

    pub fn preferred_cuisine(&self) -> &Cuisine {
        &self.form.preferred_cuisine
    }

    /// Canonical string of the booking's value for a join key
    ///
    /// Matches the canonical form table keys are indexed under.
    pub fn key_value(&self, key: JoinKey) -> String {
        match key {
            JoinKey::CustomerId => self.form.customer_id.to_string(),
            JoinKey::PreferredCuisine => self.form.preferred_cuisine.as_str().to_string(),
            JoinKey::Age => self.form.age.to_string(),
            JoinKey::NumberOfStayers => self.form.number_of_stayers.to_string(),
        }
    }
}

// =============================================================================
// Feature Values
// =============================================================================

/// A single cell of a feature table or composed row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    /// Parse a raw cell. Empty cells are absent.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(FeatureValue::Number(n)),
            _ => Some(FeatureValue::Text(trimmed.to_string())),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FeatureValue::Text(_))
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        FeatureValue::Number(n)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

/// Display renders the canonical category string: integral numbers lose
/// their fractional part so `29.0` and `29` index the same key.
impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => f.write_str(&canonical_number(*n)),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

/// Format a number the way keys and categories are compared
pub fn canonical_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// An ordered row of named feature values
///
/// Column order is insertion order; names are unique within a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Append a column unless it already exists.
    ///
    /// Returns `false` when the column was already present (the first
    /// value is kept).
    pub fn insert_if_absent(&mut self, column: impl Into<String>, value: FeatureValue) -> bool {
        let column = column.into();
        if self.contains(&column) {
            return false;
        }
        self.entries.push((column, value));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FeatureValue)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (S, FeatureValue)>>(iter: I) -> Self {
        let mut row = FeatureRow::new();
        for (name, value) in iter {
            row.insert_if_absent(name, value);
        }
        row
    }
}

// =============================================================================
// Feature Tables
// =============================================================================

/// The attribute a feature table is joined on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKey {
    CustomerId,
    PreferredCuisine,
    Age,
    NumberOfStayers,
}

impl JoinKey {
    /// Candidate keys in the order they win when a header has several
    pub const PRIORITY: [JoinKey; 4] = [
        JoinKey::CustomerId,
        JoinKey::PreferredCuisine,
        JoinKey::Age,
        JoinKey::NumberOfStayers,
    ];

    pub fn column(self) -> &'static str {
        match self {
            JoinKey::CustomerId => CUSTOMER_ID,
            JoinKey::PreferredCuisine => PREFERRED_CUISINE,
            JoinKey::Age => AGE,
            JoinKey::NumberOfStayers => NUMBER_OF_STAYERS,
        }
    }

    /// Pick the join key for a table header: customer-level first, then
    /// the coarser attribute keys.
    pub fn detect<S: AsRef<str>>(columns: &[S]) -> Option<JoinKey> {
        Self::PRIORITY
            .into_iter()
            .find(|key| columns.iter().any(|c| c.as_ref() == key.column()))
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A statically loaded lookup table keyed by its join attribute.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    name: String,
    join_key: Option<JoinKey>,
    columns: Vec<String>,
    rows: Vec<Vec<Option<FeatureValue>>>,
    /// Canonical key string -> row position
    key_index: HashMap<String, usize>,
}

impl FeatureTable {
    /// Register a table, tagging it with the key detected from its header.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Option<FeatureValue>>>,
    ) -> Self {
        let join_key = JoinKey::detect(&columns);
        Self::with_join_key(name, join_key, columns, rows)
    }

    /// Register a table with an explicit join key tag.
    ///
    /// Rows sharing a key value violate the table contract; the first one
    /// is indexed and the rest are reported.
    pub fn with_join_key(
        name: impl Into<String>,
        join_key: Option<JoinKey>,
        columns: Vec<String>,
        rows: Vec<Vec<Option<FeatureValue>>>,
    ) -> Self {
        let name = name.into();
        let mut key_index = HashMap::new();

        let key_position = join_key.and_then(|key| columns.iter().position(|c| c == key.column()));
        if let Some(pos) = key_position {
            let mut duplicates = 0usize;
            for (row_idx, row) in rows.iter().enumerate() {
                let Some(Some(cell)) = row.get(pos) else {
                    continue;
                };
                let key = cell.to_string();
                if key_index.contains_key(&key) {
                    duplicates += 1;
                } else {
                    key_index.insert(key, row_idx);
                }
            }
            if duplicates > 0 {
                warn!(
                    "Feature table {} has {} rows with a duplicate {} value; keeping the first of each",
                    name,
                    duplicates,
                    columns[pos]
                );
            }
        }

        Self {
            name,
            join_key: key_position.and(join_key),
            columns,
            rows,
            key_index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join_key(&self) -> Option<JoinKey> {
        self.join_key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Columns contributed by a join (everything except the key)
    pub fn feature_columns(&self) -> impl Iterator<Item = &str> {
        let key = self.join_key.map(JoinKey::column);
        self.columns
            .iter()
            .map(String::as_str)
            .filter(move |c| Some(*c) != key)
    }

    /// Present non-key cells of the row matching `key`, in column order
    pub fn lookup(&self, key: &str) -> Option<Vec<(&str, &FeatureValue)>> {
        let row = &self.rows[*self.key_index.get(key)?];
        let key_column = self.join_key.map(JoinKey::column);
        Some(
            self.columns
                .iter()
                .zip(row)
                .filter(|(column, _)| Some(column.as_str()) != key_column)
                .filter_map(|(column, cell)| cell.as_ref().map(|v| (column.as_str(), v)))
                .collect(),
        )
    }
}

// =============================================================================
// FeatureStore - all loaded tables
// =============================================================================

/// Registry of loaded feature tables, kept in join order.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    pub(crate) tables: Vec<FeatureTable>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. A table with the same name is replaced in place.
    pub fn insert_table(&mut self, table: FeatureTable) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&FeatureTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables in join order
    pub fn tables(&self) -> &[FeatureTable] {
        &self.tables
    }

    /// (table count, total rows) for logging
    pub fn counts(&self) -> (usize, usize) {
        let rows = self.tables.iter().map(FeatureTable::row_count).sum();
        (self.tables.len(), rows)
    }
}
