use crate::config::ValuationConfig;
use crate::models::{FinancialBreakdown, PreferenceWeights};

/// Weighted sum of year-1 and four-year compensation, scaled down by
/// `score_divisor` so amounts combine with 1-10 weights.
///
/// The scale is absolute, not relative to the other offers in the batch.
/// Work-life balance and career growth weights do not contribute yet.
pub fn calculate_alignment_score(
    financials: &FinancialBreakdown,
    preferences: &PreferenceWeights,
    config: &ValuationConfig,
) -> f64 {
    let divisor = config.score_divisor;
    let score = (financials.year_1_total_comp / divisor) * f64::from(preferences.year_1_cash)
        + (financials.four_year_average_comp / divisor) * f64::from(preferences.four_year_value);
    round_to_cents(score)
}

/// Half-to-even on `value * 100`. Decimal midpoints that are not exact in binary
/// (0.015, 2.675) round up here, where a correctly rounded decimal round goes down;
/// the error is at most one cent.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
