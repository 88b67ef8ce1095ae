//! Cross-sectional selector — turns one date's probabilities into sides.
//!
//! Pure and stateless: the same rows in the same order always produce the
//! same selection. Both backtester styles call it once per date.
//!
//! Ranking is ordinal: rows are ordered by probability and ties keep their
//! input order (first seen wins), so ranks are 1, 2, 3, ... with no gaps or
//! shared ranks. Rows without a realized next-period return are not ranked
//! and always stay flat.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::PredictionRow;

/// Which way a ticker is held on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
    Flat,
}

impl Side {
    /// Signed unit exposure: +1 long, -1 short, 0 flat.
    pub fn exposure(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
            Side::Flat => 0.0,
        }
    }
}

/// Thresholds and concurrency cap for one selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Minimum probability for a long.
    pub buy_threshold: f64,
    /// Shorts require `probability <= 1 - short_threshold`. `None` disables shorts.
    pub short_threshold: Option<f64>,
    /// Maximum tickers per side per date.
    pub max_concurrent: usize,
}

impl SelectorConfig {
    pub fn long_only(buy_threshold: f64, max_concurrent: usize) -> Self {
        Self {
            buy_threshold,
            short_threshold: None,
            max_concurrent,
        }
    }

    pub fn long_short(buy_threshold: f64, short_threshold: f64, max_concurrent: usize) -> Self {
        Self {
            buy_threshold,
            short_threshold: Some(short_threshold),
            max_concurrent,
        }
    }
}

/// Side per input row, aligned index-for-index with the rows passed to [`select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    sides: Vec<Side>,
}

impl Selection {
    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    pub fn side(&self, index: usize) -> Side {
        self.sides.get(index).copied().unwrap_or(Side::Flat)
    }

    pub fn long_count(&self) -> usize {
        self.sides.iter().filter(|s| **s == Side::Long).count()
    }

    pub fn short_count(&self) -> usize {
        self.sides.iter().filter(|s| **s == Side::Short).count()
    }

    /// Whether every row is flat.
    pub fn is_flat(&self) -> bool {
        self.sides.iter().all(|s| *s == Side::Flat)
    }

    /// `(ticker, side)` pairs in row order.
    pub fn assignments<'a>(&self, rows: &'a [PredictionRow]) -> Vec<(&'a str, Side)> {
        rows.iter()
            .zip(&self.sides)
            .map(|(row, side)| (row.ticker.as_str(), *side))
            .collect()
    }
}

/// Indices of tradable rows ordered by probability, highest first; ties keep input order.
pub fn rank_descending(rows: &[PredictionRow]) -> Vec<usize> {
    ranked(rows, |a, b| b.total_cmp(&a))
}

/// Indices of tradable rows ordered by probability, lowest first; ties keep input order.
pub fn rank_ascending(rows: &[PredictionRow]) -> Vec<usize> {
    ranked(rows, |a, b| a.total_cmp(&b))
}

fn ranked(rows: &[PredictionRow], cmp: impl Fn(f64, f64) -> Ordering) -> Vec<usize> {
    let mut order: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_tradable())
        .map(|(i, _)| i)
        .collect();
    // sort_by is stable: equal probabilities stay in input order.
    order.sort_by(|&a, &b| cmp(rows[a].probability, rows[b].probability));
    order
}

/// Assign a side to every row of one date.
///
/// - Long iff `probability >= buy_threshold` and descending rank `<= max_concurrent`.
/// - Short iff shorts are enabled, `probability <= 1 - short_threshold` and
///   ascending rank `<= max_concurrent`.
///
/// A row that qualifies for both sides (overlapping thresholds) stays long.
pub fn select(rows: &[PredictionRow], config: &SelectorConfig) -> Selection {
    let mut sides = vec![Side::Flat; rows.len()];

    for &i in rank_descending(rows).iter().take(config.max_concurrent) {
        if rows[i].probability >= config.buy_threshold {
            sides[i] = Side::Long;
        }
    }

    if let Some(short_threshold) = config.short_threshold {
        let ceiling = 1.0 - short_threshold;
        for &i in rank_ascending(rows).iter().take(config.max_concurrent) {
            if rows[i].probability <= ceiling && sides[i] != Side::Long {
                sides[i] = Side::Short;
            }
        }
    }

    Selection { sides }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows(probs: &[(&str, f64)]) -> Vec<PredictionRow> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        probs
            .iter()
            .map(|(t, p)| PredictionRow::new(date, *t, 100.0, *p, Some(0.0)))
            .collect()
    }

    #[test]
    fn long_requires_threshold_and_rank() {
        let day = rows(&[("A", 0.9), ("B", 0.7), ("C", 0.65), ("D", 0.3)]);
        let sel = select(&day, &SelectorConfig::long_only(0.6, 2));
        assert_eq!(
            sel.sides(),
            &[Side::Long, Side::Long, Side::Flat, Side::Flat]
        );
    }

    #[test]
    fn below_threshold_never_selected_even_with_free_slots() {
        let day = rows(&[("A", 0.55), ("B", 0.59)]);
        let sel = select(&day, &SelectorConfig::long_only(0.6, 5));
        assert!(sel.is_flat());
    }

    #[test]
    fn threshold_is_inclusive() {
        let day = rows(&[("A", 0.6)]);
        let sel = select(&day, &SelectorConfig::long_only(0.6, 1));
        assert_eq!(sel.side(0), Side::Long);
    }

    #[test]
    fn ties_broken_by_input_order() {
        let day = rows(&[("Z", 0.8), ("A", 0.8), ("M", 0.8)]);
        let sel = select(&day, &SelectorConfig::long_only(0.6, 2));
        assert_eq!(
            sel.assignments(&day),
            vec![("Z", Side::Long), ("A", Side::Long), ("M", Side::Flat)]
        );
    }

    #[test]
    fn shorts_take_lowest_probabilities() {
        let day = rows(&[("A", 0.9), ("B", 0.35), ("C", 0.1), ("D", 0.2)]);
        let sel = select(&day, &SelectorConfig::long_short(0.6, 0.6, 2));
        assert_eq!(
            sel.sides(),
            &[Side::Long, Side::Flat, Side::Short, Side::Short]
        );
        assert_eq!(sel.long_count(), 1);
        assert_eq!(sel.short_count(), 2);
    }

    #[test]
    fn long_only_config_never_shorts() {
        let day = rows(&[("A", 0.01), ("B", 0.02)]);
        let sel = select(&day, &SelectorConfig::long_only(0.6, 3));
        assert_eq!(sel.short_count(), 0);
    }

    #[test]
    fn overlapping_thresholds_keep_long() {
        // buy >= 0.3 and short <= 1 - 0.2 = 0.8 overlap on [0.3, 0.8].
        let day = rows(&[("A", 0.5)]);
        let sel = select(&day, &SelectorConfig::long_short(0.3, 0.2, 1));
        assert_eq!(sel.side(0), Side::Long);
    }

    #[test]
    fn rows_without_return_are_not_ranked() {
        let mut day = rows(&[("A", 0.95), ("B", 0.9)]);
        day[0].next_period_return = None;
        let sel = select(&day, &SelectorConfig::long_only(0.6, 1));
        assert_eq!(sel.sides(), &[Side::Flat, Side::Long]);
        assert_eq!(rank_descending(&day), vec![1]);
    }

    #[test]
    fn zero_cap_selects_nothing() {
        let day = rows(&[("A", 0.99), ("B", 0.01)]);
        let sel = select(&day, &SelectorConfig::long_short(0.6, 0.6, 0));
        assert!(sel.is_flat());
    }

    #[test]
    fn empty_day_is_empty_selection() {
        let sel = select(&[], &SelectorConfig::long_only(0.6, 3));
        assert!(sel.sides().is_empty());
        assert_eq!(sel.side(0), Side::Flat);
    }

    #[test]
    fn ascending_rank_ties_keep_input_order() {
        let day = rows(&[("A", 0.2), ("B", 0.1), ("C", 0.1)]);
        assert_eq!(rank_ascending(&day), vec![1, 2, 0]);
        assert_eq!(rank_descending(&day), vec![0, 1, 2]);
    }
}
