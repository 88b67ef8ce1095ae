//! DailyResult — the per-date return/equity series every backtester emits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Starting equity for series built from returns alone.
pub const BASE_EQUITY: f64 = 10_000.0;

/// One row of a strategy's output series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub strategy_return: f64,
    pub equity: f64,
}

/// Ordered `(date, return, equity)` series, one point per panel date, ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    points: Vec<DailyPoint>,
}

impl DailyResult {
    pub fn new(points: Vec<DailyPoint>) -> Self {
        Self { points }
    }

    /// Compound a `(date, return)` series into equity starting at `initial`.
    ///
    /// `equity[i] = initial * prod(1 + return[k])` for `k <= i`, so the first
    /// point already includes the first return.
    pub fn from_returns(returns: Vec<(NaiveDate, f64)>, initial: f64) -> Self {
        let mut equity = initial;
        let points = returns
            .into_iter()
            .map(|(date, strategy_return)| {
                equity *= 1.0 + strategy_return;
                DailyPoint {
                    date,
                    strategy_return,
                    equity,
                }
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strategy_return).collect()
    }

    pub fn equity(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.equity)
    }
}

/// Compound a bare return series into an equity curve starting at `initial`.
pub fn equity_curve_from_returns(returns: &[f64], initial: f64) -> Vec<f64> {
    returns
        .iter()
        .scan(initial, |equity, r| {
            *equity *= 1.0 + r;
            Some(*equity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn from_returns_compounds_from_first_point() {
        let daily = DailyResult::from_returns(vec![(d(2), 0.1), (d(3), -0.5)], 100.0);
        let eq = daily.equity();
        assert!((eq[0] - 110.0).abs() < 1e-10);
        assert!((eq[1] - 55.0).abs() < 1e-10);
        assert_eq!(daily.dates(), vec![d(2), d(3)]);
    }

    #[test]
    fn zero_returns_keep_equity_flat() {
        let daily = DailyResult::from_returns((2..6).map(|day| (d(day), 0.0)).collect(), BASE_EQUITY);
        assert!(daily.equity().iter().all(|&e| e == BASE_EQUITY));
    }

    #[test]
    fn equity_curve_matches_daily_result() {
        let returns = [0.01, -0.02, 0.005];
        let curve = equity_curve_from_returns(&returns, BASE_EQUITY);
        let daily = DailyResult::from_returns(
            returns.iter().enumerate().map(|(i, r)| (d(i as u32 + 2), *r)).collect(),
            BASE_EQUITY,
        );
        assert_eq!(curve, daily.equity());
    }

    #[test]
    fn empty_series() {
        let daily = DailyResult::from_returns(Vec::new(), BASE_EQUITY);
        assert!(daily.is_empty());
        assert_eq!(daily.final_equity(), None);
        assert!(equity_curve_from_returns(&[], 1.0).is_empty());
    }
}
