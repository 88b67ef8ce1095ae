//! Vectorized equal-weight backtester.
//!
//! One pipeline, parameterized by selection rule and aggregation:
//!
//! 1. per date, the selector assigns each row a side (exposure -1/0/+1)
//! 2. per row, `contribution = exposure * next_period_return - cost`, where
//!    `cost = |exposure - previous exposure of that ticker| * fee_bps / 10_000`
//! 3. per date, contributions are reduced by the [`Aggregation`] rule
//!
//! The first row of a ticker has no previous exposure and pays no cost.
//! Rows without a realized return are forced flat and left out of the
//! aggregation, but still update the ticker's previous exposure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{DailyResult, Panel, BASE_EQUITY};
use crate::selector::{select, SelectorConfig};

/// How row contributions collapse into one daily return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Plain mean over every row with a realized return, selected or not.
    /// Unselected rows contribute 0 (less any exit cost) but still count in
    /// the denominator, diluting the return by universe size.
    UniverseMean,
    /// Mean over rows with non-zero exposure, weighted by `|exposure|`.
    /// A date with no exposure returns exactly 0.
    ExposureWeighted,
}

/// A row's exposure and its net contribution for the date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowContribution {
    pub exposure: f64,
    pub value: f64,
}

impl Aggregation {
    pub fn aggregate(self, rows: &[RowContribution]) -> f64 {
        match self {
            Aggregation::UniverseMean => {
                if rows.is_empty() {
                    return 0.0;
                }
                rows.iter().map(|r| r.value).sum::<f64>() / rows.len() as f64
            }
            Aggregation::ExposureWeighted => {
                let gross: f64 = rows.iter().map(|r| r.exposure.abs()).sum();
                if gross == 0.0 {
                    return 0.0;
                }
                rows.iter()
                    .map(|r| r.exposure.abs() / gross * r.value)
                    .sum()
            }
        }
    }
}

/// Parameters of one vectorized run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizedConfig {
    pub selector: SelectorConfig,
    pub fee_bps: f64,
    pub aggregation: Aggregation,
}

impl VectorizedConfig {
    /// Long the top names above `buy_threshold`; average over the whole universe.
    pub fn long_only(buy_threshold: f64, fee_bps: f64, max_concurrent: usize) -> Self {
        Self {
            selector: SelectorConfig::long_only(buy_threshold, max_concurrent),
            fee_bps,
            aggregation: Aggregation::UniverseMean,
        }
    }

    /// Long the top, short the bottom; average over held names only.
    pub fn long_short(
        buy_threshold: f64,
        short_threshold: f64,
        fee_bps: f64,
        max_concurrent: usize,
    ) -> Self {
        Self {
            selector: SelectorConfig::long_short(buy_threshold, short_threshold, max_concurrent),
            fee_bps,
            aggregation: Aggregation::ExposureWeighted,
        }
    }
}

/// Run the vectorized pipeline over every date of the panel.
///
/// Emits exactly one point per distinct panel date, even when nothing is
/// held. Equity compounds from [`BASE_EQUITY`].
pub fn run_vectorized(panel: &Panel, config: &VectorizedConfig) -> DailyResult {
    let fee_rate = config.fee_bps / 10_000.0;
    let mut previous: HashMap<&str, f64> = HashMap::new();
    let mut returns = Vec::with_capacity(panel.date_count());
    let mut contributions: Vec<RowContribution> = Vec::new();

    for day in panel.days() {
        let selection = select(day.rows, &config.selector);
        contributions.clear();

        for (row, side) in day.rows.iter().zip(selection.sides()) {
            let exposure = side.exposure();
            let cost = match previous.insert(row.ticker.as_str(), exposure) {
                Some(prev) => (exposure - prev).abs() * fee_rate,
                None => 0.0,
            };
            if let Some(r) = row.next_period_return {
                contributions.push(RowContribution {
                    exposure,
                    value: exposure * r - cost,
                });
            }
        }

        let day_return = config.aggregation.aggregate(&contributions);
        debug!(
            date = %day.date,
            longs = selection.long_count(),
            shorts = selection.short_count(),
            day_return,
            "vectorized step"
        );
        returns.push((day.date, day_return));
    }

    DailyResult::from_returns(returns, BASE_EQUITY)
}

/// Long-only threshold strategy.
pub fn run_long_only(
    panel: &Panel,
    buy_threshold: f64,
    fee_bps: f64,
    max_concurrent: usize,
) -> DailyResult {
    run_vectorized(
        panel,
        &VectorizedConfig::long_only(buy_threshold, fee_bps, max_concurrent),
    )
}

/// Long-short threshold strategy.
pub fn run_long_short(
    panel: &Panel,
    buy_threshold: f64,
    short_threshold: f64,
    fee_bps: f64,
    max_concurrent: usize,
) -> DailyResult {
    run_vectorized(
        panel,
        &VectorizedConfig::long_short(buy_threshold, short_threshold, fee_bps, max_concurrent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PredictionRow;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(day: u32, ticker: &str, prob: f64, ret: Option<f64>) -> PredictionRow {
        PredictionRow::new(d(day), ticker, 100.0, prob, ret)
    }

    fn assert_returns(daily: &DailyResult, expected: &[f64]) {
        let got = daily.returns();
        assert_eq!(got.len(), expected.len(), "length mismatch: {got:?}");
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < 1e-12, "got {got:?}, expected {expected:?}");
        }
    }

    #[test]
    fn universe_mean_counts_unselected_rows() {
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.02)),
            row(2, "B", 0.1, Some(0.50)),
            row(2, "C", 0.2, Some(-0.30)),
            row(2, "D", 0.3, Some(0.10)),
        ]);
        let daily = run_long_only(&panel, 0.6, 0.0, 3);
        assert_returns(&daily, &[0.005]);
    }

    #[test]
    fn entry_on_first_row_is_free_but_exit_is_charged() {
        // A is selected on day 2 (first row, no cost), dropped on day 3 (exit cost).
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.01)),
            row(3, "A", 0.1, Some(0.01)),
            row(4, "A", 0.9, Some(0.01)),
        ]);
        let daily = run_long_only(&panel, 0.6, 10.0, 1);
        assert_returns(&daily, &[0.01, -0.001, 0.01 - 0.001]);
    }

    #[test]
    fn holding_through_dates_pays_no_cost() {
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.01)),
            row(3, "A", 0.9, Some(0.02)),
        ]);
        let daily = run_long_only(&panel, 0.6, 25.0, 1);
        assert_returns(&daily, &[0.01, 0.02]);
    }

    #[test]
    fn long_short_flip_costs_twice() {
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.01)),
            row(3, "A", 0.1, Some(-0.02)),
        ]);
        let daily = run_long_short(&panel, 0.6, 0.6, 10.0, 1);
        // Day 3: short, |(-1) - 1| = 2 units of cost; -1 * -0.02 - 0.002.
        assert_returns(&daily, &[0.01, 0.02 - 0.002]);
    }

    #[test]
    fn long_short_flat_date_is_exactly_zero() {
        let panel = Panel::new(vec![
            row(2, "A", 0.5, Some(0.03)),
            row(2, "B", 0.5, Some(-0.03)),
            row(3, "A", 0.9, Some(0.01)),
        ]);
        let daily = run_long_short(&panel, 0.6, 0.6, 5.0, 3);
        assert_eq!(daily.returns()[0], 0.0);
        assert_eq!(daily.equity()[0], BASE_EQUITY);
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn long_short_weights_only_held_names() {
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.04)),
            row(2, "B", 0.1, Some(-0.02)),
            row(2, "C", 0.5, Some(0.90)),
        ]);
        let daily = run_long_short(&panel, 0.6, 0.6, 0.0, 1);
        // (0.04 + 0.02) / 2
        assert_returns(&daily, &[0.03]);
    }

    #[test]
    fn long_short_ignores_exit_cost_of_flat_rows() {
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.01)),
            row(2, "B", 0.5, Some(0.00)),
            row(3, "A", 0.5, Some(0.01)),
            row(3, "B", 0.9, Some(0.02)),
        ]);
        let daily = run_long_short(&panel, 0.6, 0.6, 10.0, 1);
        // Day 3: B enters (+1 from 0, cost 0.001); A's exit cost has zero weight.
        assert_returns(&daily, &[0.01, 0.02 - 0.001]);
    }

    #[test]
    fn missing_return_rows_are_excluded_from_mean() {
        let panel = Panel::new(vec![
            row(2, "A", 0.9, Some(0.02)),
            row(2, "B", 0.2, None),
        ]);
        let daily = run_long_only(&panel, 0.6, 0.0, 3);
        assert_returns(&daily, &[0.02]);
    }

    #[test]
    fn date_with_only_missing_returns_is_zero() {
        let panel = Panel::new(vec![row(2, "A", 0.9, Some(0.01)), row(3, "A", 0.9, None)]);
        let long_only = run_long_only(&panel, 0.6, 5.0, 3);
        assert_eq!(long_only.len(), 2);
        assert_eq!(long_only.returns()[1], 0.0);
        assert!(long_only.returns().iter().all(|r| r.is_finite()));
    }

    #[test]
    fn empty_panel_yields_empty_series() {
        let daily = run_long_only(&Panel::default(), 0.6, 5.0, 3);
        assert!(daily.is_empty());
    }

    #[test]
    fn aggregation_rules() {
        let rows = [
            RowContribution { exposure: 1.0, value: 0.02 },
            RowContribution { exposure: 0.0, value: -0.001 },
            RowContribution { exposure: -1.0, value: 0.04 },
        ];
        assert!((Aggregation::UniverseMean.aggregate(&rows) - 0.059 / 3.0).abs() < 1e-12);
        assert!((Aggregation::ExposureWeighted.aggregate(&rows) - 0.03).abs() < 1e-12);
        assert_eq!(Aggregation::UniverseMean.aggregate(&[]), 0.0);
        assert_eq!(Aggregation::ExposureWeighted.aggregate(&[]), 0.0);
    }
}
