//! Feature composition.
//!
//! Builds one wide row per booking: the booking's own model features
//! followed by every feature table left-joined on its join key, in the
//! store's table order.

use feature_store::types::{
    AGE, BOOKED_THROUGH_POINTS, CHECK_IN_DAY, CHECK_IN_MONTH, CHECK_OUT_DAY, CHECK_OUT_MONTH,
    NUMBER_OF_STAYERS, PREFERRED_CUISINE, STAY_DURATION,
};
use feature_store::{BookingRequest, FeatureRow, FeatureStore, FeatureValue, JoinKey};
use std::sync::Arc;
use tracing::debug;

/// How a single table join went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub table: String,
    /// `None` when the table has no compatible key and was skipped
    pub key: Option<JoinKey>,
    pub matched: bool,
}

/// The composed row plus a record of each join
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedRow {
    pub row: FeatureRow,
    pub joins: Vec<JoinOutcome>,
}

impl ComposedRow {
    pub fn matched_tables(&self) -> impl Iterator<Item = &str> {
        self.joins
            .iter()
            .filter(|j| j.matched)
            .map(|j| j.table.as_str())
    }
}

/// Left-joins bookings against the loaded feature tables.
#[derive(Debug, Clone)]
pub struct FeatureComposer {
    store: Arc<FeatureStore>,
}

impl FeatureComposer {
    pub fn new(store: Arc<FeatureStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    /// Compose the wide row for one booking.
    ///
    /// ## Algorithm
    /// 1. Start from the booking's model features (raw id and dates excluded)
    /// 2. For each table in order, look up the booking's value for the
    ///    table's join key; skip tables without one
    /// 3. On a match append the table's present feature cells; a column
    ///    already in the row keeps its first value
    /// 4. On a miss the table's columns stay absent
    pub fn compose(&self, booking: &BookingRequest) -> ComposedRow {
        let mut row = base_row(booking);
        let mut joins = Vec::with_capacity(self.store.tables().len());

        for table in self.store.tables() {
            let Some(key) = table.join_key() else {
                debug!("Skipping table {}: no compatible join key", table.name());
                joins.push(JoinOutcome {
                    table: table.name().to_string(),
                    key: None,
                    matched: false,
                });
                continue;
            };

            let key_value = booking.key_value(key);
            let matched = match table.lookup(&key_value) {
                Some(cells) => {
                    for (column, value) in cells {
                        if !row.insert_if_absent(column, value.clone()) {
                            debug!(
                                "Column {} from table {} already composed; keeping first value",
                                column,
                                table.name()
                            );
                        }
                    }
                    true
                }
                None => false,
            };

            debug!(
                "Joined {} on {}={} (matched: {})",
                table.name(),
                key,
                key_value,
                matched
            );
            joins.push(JoinOutcome {
                table: table.name().to_string(),
                key: Some(key),
                matched,
            });
        }

        ComposedRow { row, joins }
    }
}

/// The booking's own model features.
///
/// `customer_id` and the two raw dates are join keys / inputs to derived
/// fields, not model features, so they never enter the row.
pub fn base_row(booking: &BookingRequest) -> FeatureRow {
    let form = booking.form();
    let stay = booking.stay();

    [
        (
            PREFERRED_CUISINE,
            FeatureValue::from(form.preferred_cuisine.as_str()),
        ),
        (AGE, FeatureValue::from(f64::from(form.age))),
        (
            BOOKED_THROUGH_POINTS,
            FeatureValue::from(if form.booked_through_points { 1.0 } else { 0.0 }),
        ),
        (
            NUMBER_OF_STAYERS,
            FeatureValue::from(f64::from(form.number_of_stayers)),
        ),
        (CHECK_IN_DAY, FeatureValue::from(f64::from(stay.check_in_day))),
        (CHECK_OUT_DAY, FeatureValue::from(f64::from(stay.check_out_day))),
        (CHECK_IN_MONTH, FeatureValue::from(f64::from(stay.check_in_month))),
        (CHECK_OUT_MONTH, FeatureValue::from(f64::from(stay.check_out_month))),
        (STAY_DURATION, FeatureValue::from(stay.stay_duration as f64)),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_store::types::{CHECK_IN_DATE, CHECK_OUT_DATE, CUSTOMER_ID};
    use feature_store::{BookingForm, Cuisine, FeatureTable};

    fn booking() -> BookingRequest {
        BookingRequest::new(BookingForm {
            customer_id: 12345,
            preferred_cuisine: Cuisine::SouthIndian,
            age: 29,
            check_in_date: "2026-10-20".parse().unwrap(),
            check_out_date: "2026-10-23".parse().unwrap(),
            booked_through_points: false,
            number_of_stayers: 2,
        })
        .unwrap()
    }

    fn table(name: &str, columns: &[&str], rows: Vec<Vec<FeatureValue>>) -> FeatureTable {
        FeatureTable::new(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(Some).collect())
                .collect(),
        )
    }

    #[test]
    fn test_base_row_excludes_raw_keys() {
        let row = base_row(&booking());

        assert!(!row.contains(CUSTOMER_ID));
        assert!(!row.contains(CHECK_IN_DATE));
        assert!(!row.contains(CHECK_OUT_DATE));
        assert_eq!(row.get(STAY_DURATION), Some(&FeatureValue::Number(3.0)));
        assert_eq!(
            row.get(PREFERRED_CUISINE),
            Some(&FeatureValue::Text("South Indian".to_string()))
        );
        assert_eq!(row.len(), 9);
    }

    #[test]
    fn test_compose_joins_each_table_on_its_key() {
        let mut store = FeatureStore::new();
        store.insert_table(table(
            "customer_features",
            // Has both customer_id and age: customer_id wins
            &["customer_id", "age", "visits"],
            vec![vec![12345.0.into(), 30.0.into(), 5.0.into()]],
        ));
        store.insert_table(table(
            "cuisine_features",
            &["preferred_cuisine", "cuisine_popularity"],
            vec![vec!["South Indian".into(), 0.7.into()]],
        ));
        store.insert_table(table(
            "stayed_features",
            &["number_of_stayers", "avg_bill"],
            vec![vec![3.0.into(), 900.0.into()]],
        ));
        store.insert_table(table("notes", &["season", "weight"], vec![]));

        let composed = FeatureComposer::new(Arc::new(store)).compose(&booking());

        assert_eq!(composed.row.get("visits"), Some(&FeatureValue::Number(5.0)));
        assert_eq!(
            composed.row.get("cuisine_popularity"),
            Some(&FeatureValue::Number(0.7))
        );
        // The booking's own age is kept over the table's
        assert_eq!(composed.row.get("age"), Some(&FeatureValue::Number(29.0)));
        // No row for two stayers: left join leaves the column absent
        assert!(!composed.row.contains("avg_bill"));

        let matched: Vec<_> = composed.matched_tables().collect();
        assert_eq!(matched, vec!["customer_features", "cuisine_features"]);
        assert_eq!(composed.joins[3].key, None);
    }

    #[test]
    fn test_compose_without_any_match() {
        let mut store = FeatureStore::new();
        store.insert_table(table(
            "customer_features",
            &["customer_id", "visits"],
            vec![vec![1.0.into(), 2.0.into()]],
        ));

        let composed = FeatureComposer::new(Arc::new(store)).compose(&booking());
        assert_eq!(composed.row, base_row(&booking()));
        assert_eq!(composed.matched_tables().count(), 0);
    }
}
