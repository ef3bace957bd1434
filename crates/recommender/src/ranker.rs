//! Turning a probability distribution into ranked dish names.

use inference::LabelDecoder;
use serde::Serialize;
use std::cmp::Ordering;

/// Number of dishes returned when the caller doesn't ask for a specific K
pub const DEFAULT_TOP_K: usize = 3;

/// One scored dish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
    pub class_index: usize,
}

/// NaN sorts below every real probability
fn rank_key(p: f64) -> f64 {
    if p.is_nan() { f64::NEG_INFINITY } else { p }
}

/// The `k` most probable dishes, highest first.
///
/// Ties keep the lower class index first. `k` larger than the vocabulary
/// returns every dish. Indices the decoder doesn't know are skipped.
pub fn rank_top_k(probabilities: &[f64], labels: &LabelDecoder, k: usize) -> Vec<Prediction> {
    let mut ranked = distribution(probabilities, labels);
    ranked.sort_by(compare);
    ranked.truncate(k);
    ranked
}

/// Every dish in class-index order
pub fn distribution(probabilities: &[f64], labels: &LabelDecoder) -> Vec<Prediction> {
    (0..probabilities.len())
        .filter_map(|idx| prediction(probabilities, labels, idx))
        .collect()
}

fn prediction(probabilities: &[f64], labels: &LabelDecoder, idx: usize) -> Option<Prediction> {
    Some(Prediction {
        label: labels.decode(idx)?.to_string(),
        probability: probabilities[idx],
        class_index: idx,
    })
}

/// Compare two predictions the way `rank_top_k` orders them
pub fn compare(a: &Prediction, b: &Prediction) -> Ordering {
    rank_key(b.probability)
        .total_cmp(&rank_key(a.probability))
        .then_with(|| a.class_index.cmp(&b.class_index))
}
