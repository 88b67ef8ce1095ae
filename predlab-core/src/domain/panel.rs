//! Panel — the full (date, ticker) prediction table, indexed by date.
//!
//! Rows are stored sorted by `(date, ticker)`. A per-date index lets the
//! backtesters walk one cross-section at a time in ascending date order
//! without regrouping.
//!
//! Input-quality precondition: for a fixed ticker, dates are unique. The
//! engines do not detect duplicate `(date, ticker)` pairs; loaders call
//! [`Panel::check_unique`] before handing a panel to them.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

use super::row::PredictionRow;

/// Structural problems in a panel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("duplicate row for ticker '{ticker}' on {date}")]
    DuplicateRow { date: NaiveDate, ticker: String },
}

/// One date's cross-section.
#[derive(Debug, Clone, Copy)]
pub struct PanelDay<'a> {
    pub date: NaiveDate,
    pub rows: &'a [PredictionRow],
}

/// Prediction table sorted by `(date, ticker)`.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    rows: Vec<PredictionRow>,
    days: Vec<(NaiveDate, Range<usize>)>,
}

impl Panel {
    /// Build a panel from rows in any order.
    ///
    /// The sort is stable, so rows sharing a `(date, ticker)` key keep their
    /// input order.
    pub fn new(mut rows: Vec<PredictionRow>) -> Self {
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));

        let mut days: Vec<(NaiveDate, Range<usize>)> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            match days.last_mut() {
                Some((date, range)) if *date == row.date => range.end = i + 1,
                _ => days.push((row.date, i..i + 1)),
            }
        }

        Self { rows, days }
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct dates.
    pub fn date_count(&self) -> usize {
        self.days.len()
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|(d, _)| *d).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|(d, _)| *d)
    }

    /// Cross-sections in ascending date order.
    pub fn days(&self) -> impl Iterator<Item = PanelDay<'_>> + '_ {
        self.days.iter().map(move |(date, range)| PanelDay {
            date: *date,
            rows: &self.rows[range.clone()],
        })
    }

    /// Distinct tickers, sorted.
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self
            .rows
            .iter()
            .map(|r| r.ticker.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        tickers.sort_unstable();
        tickers
    }

    /// Restrict the panel to `[start, end]` (either bound optional, inclusive).
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Panel {
        let rows = self
            .rows
            .iter()
            .filter(|r| start.map_or(true, |s| r.date >= s) && end.map_or(true, |e| r.date <= e))
            .cloned()
            .collect();
        Panel::new(rows)
    }

    /// Reject duplicate `(date, ticker)` pairs.
    pub fn check_unique(&self) -> Result<(), PanelError> {
        for day in self.days() {
            for pair in day.rows.windows(2) {
                if pair[0].ticker == pair[1].ticker {
                    return Err(PanelError::DuplicateRow {
                        date: day.date,
                        ticker: pair[1].ticker.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<PredictionRow>> for Panel {
    fn from(rows: Vec<PredictionRow>) -> Self {
        Panel::new(rows)
    }
}
