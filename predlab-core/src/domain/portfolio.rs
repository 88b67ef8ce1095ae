//! PortfolioState — free cash plus the open positions of one simulation run.

use super::position::Position;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Cash and open positions, owned by exactly one simulation run.
///
/// The accounting identity holds after every operation:
/// `total_equity == cash + sum(position equities)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub positions: BTreeMap<String, Position>,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            positions: BTreeMap::new(),
        }
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn holds(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn positions_equity(&self) -> f64 {
        self.positions.values().map(|p| p.equity).sum()
    }

    pub fn total_equity(&self) -> f64 {
        self.cash + self.positions_equity()
    }

    /// Open a position funded by `allocation` of free cash.
    ///
    /// Cash is debited by the full allocation; the entry fee reduces the
    /// invested amount, so it shows up in the position's equity instead.
    pub fn open(
        &mut self,
        ticker: &str,
        date: NaiveDate,
        price: f64,
        allocation: f64,
        fee_rate: f64,
    ) -> &Position {
        let invested = allocation * (1.0 - fee_rate);
        self.cash -= allocation;
        self.positions
            .insert(ticker.to_string(), Position::open(ticker, date, price, invested));
        &self.positions[ticker]
    }

    /// Close a position, crediting `equity * (1 - fee_rate)` to cash.
    ///
    /// Returns the removed position and the credited proceeds.
    pub fn close(&mut self, ticker: &str, fee_rate: f64) -> Option<(Position, f64)> {
        let position = self.positions.remove(ticker)?;
        let proceeds = position.equity * (1.0 - fee_rate);
        self.cash += proceeds;
        Some((position, proceeds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn new_state_is_all_cash() {
        let state = PortfolioState::new(10_000.0);
        assert_eq!(state.total_equity(), 10_000.0);
        assert_eq!(state.open_count(), 0);
    }

    #[test]
    fn open_debits_full_allocation_and_charges_fee_in_equity() {
        let mut state = PortfolioState::new(10_000.0);
        let pos = state.open("AAPL", date(), 100.0, 5_000.0, 0.001).clone();
        assert!((pos.equity - 4_995.0).abs() < 1e-9);
        assert!((pos.quantity - 49.95).abs() < 1e-9);
        assert!((state.cash - 5_000.0).abs() < 1e-9);
        assert!((state.total_equity() - 9_995.0).abs() < 1e-9);
        assert!(state.holds("AAPL"));
    }

    #[test]
    fn close_credits_equity_net_of_exit_fee() {
        let mut state = PortfolioState::new(10_000.0);
        state.open("AAPL", date(), 100.0, 10_000.0, 0.0);
        state.positions.get_mut("AAPL").unwrap().mark(0.10);

        let (closed, proceeds) = state.close("AAPL", 0.001).unwrap();
        assert_eq!(closed.ticker, "AAPL");
        assert!((proceeds - 11_000.0 * 0.999).abs() < 1e-9);
        assert!((state.cash - proceeds).abs() < 1e-9);
        assert!(!state.holds("AAPL"));
    }

    #[test]
    fn close_unknown_ticker_is_noop() {
        let mut state = PortfolioState::new(10_000.0);
        assert!(state.close("MSFT", 0.001).is_none());
        assert_eq!(state.cash, 10_000.0);
    }

    #[test]
    fn equity_identity_holds() {
        let mut state = PortfolioState::new(9_000.0);
        state.open("A", date(), 10.0, 3_000.0, 0.0005);
        state.open("B", date(), 20.0, 3_000.0, 0.0005);
        state.positions.get_mut("A").unwrap().mark(0.02);
        let expected = state.cash + state.positions.values().map(|p| p.equity).sum::<f64>();
        assert!((state.total_equity() - expected).abs() < 1e-10);
    }
}
