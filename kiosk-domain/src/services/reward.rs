use crate::value_objects::{RateTable, WasteCategory};

/// Reward for `weight` grams, rounded to two decimal places.
pub fn compute_amount(weight: f64, category: WasteCategory, rates: &RateTable) -> f64 {
    round_cents(weight * rates.rate_for(category))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
