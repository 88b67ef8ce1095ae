use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long holding in the event-driven simulator.
///
/// `equity` is the position's tracked value. It starts at the post-fee invested
/// amount and compounds by each date's realized return. It is not floored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: f64,
    pub equity: f64,
}

impl Position {
    /// Open with `invested` capital (already net of the entry fee) at `price`.
    pub fn open(ticker: impl Into<String>, entry_date: NaiveDate, price: f64, invested: f64) -> Self {
        Self {
            ticker: ticker.into(),
            entry_date,
            entry_price: price,
            quantity: invested / price,
            equity: invested,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.entry_price
    }

    /// Compound one period's realized return into the tracked equity.
    pub fn mark(&mut self, period_return: f64) {
        self.equity *= 1.0 + period_return;
    }

    /// Cumulative return since entry; 0 when the cost basis is zero.
    pub fn return_since_entry(&self) -> f64 {
        let basis = self.cost_basis();
        if basis == 0.0 {
            return 0.0;
        }
        self.equity / basis - 1.0
    }
}
