//! PredictionRow — one (date, ticker) observation of the prediction panel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a row was rejected by [`PredictionRow::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("ticker is empty")]
    EmptyTicker,

    #[error("price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    #[error("probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("next-period return must be finite when present, got {0}")]
    InvalidReturn(f64),
}

/// A single panel row: the model's view of one ticker on one date.
///
/// `next_period_return` is the realized return from this date to the next one.
/// It is `None` on the last date of each ticker, where no future price exists;
/// such rows are never eligible for a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub price: f64,
    pub probability: f64,
    pub next_period_return: Option<f64>,
}

impl PredictionRow {
    pub fn new(
        date: NaiveDate,
        ticker: impl Into<String>,
        price: f64,
        probability: f64,
        next_period_return: Option<f64>,
    ) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            price,
            probability,
            next_period_return,
        }
    }

    /// Whether the row carries a realized return and may therefore hold a position.
    pub fn is_tradable(&self) -> bool {
        self.next_period_return.is_some()
    }

    /// Input sanity check used by the loaders. The engines assume rows already passed it.
    pub fn validate(&self) -> Result<(), RowError> {
        if self.ticker.trim().is_empty() {
            return Err(RowError::EmptyTicker);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(RowError::InvalidPrice(self.price));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(RowError::InvalidProbability(self.probability));
        }
        match self.next_period_return {
            Some(r) if !r.is_finite() => Err(RowError::InvalidReturn(r)),
            _ => Ok(()),
        }
    }
}
