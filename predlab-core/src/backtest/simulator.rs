//! Event-driven portfolio simulator with stop-loss / take-profit exits.
//!
//! Dates are processed strictly in ascending order. Each date runs five
//! phases against the run's own [`PortfolioState`]:
//!
//! 1. **Mark**: every open position compounds that date's realized
//!    next-period return into its equity, then its return since entry is
//!    checked against `stop_loss` / `take_profit` (both inclusive).
//! 2. **Close**: flagged positions return `equity * (1 - fee)` to cash.
//! 3. **Open**: tradable candidates with `probability >= buy_threshold`, ranked
//!    by probability (ties in input order), skipping tickers already held,
//!    fill the free slots. Current free cash is split evenly across the new
//!    names; each invests `allocation * (1 - fee)` and cash is debited the
//!    full allocation.
//! 4. **Snapshot**: total equity = cash + sum of position equities.
//! 5. **Return**: `equity / previous equity - 1`, 0 on the first date.
//!
//! Because exits run before entries, cash freed on a date funds entries on
//! that same date. A held ticker with no row (or no realized return) on a
//! date is neither marked nor evaluated for exit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{DailyPoint, DailyResult, Panel, PortfolioState};
use crate::selector::rank_descending;

/// Parameters of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub buy_threshold: f64,
    /// Negative fraction, e.g. -0.03.
    pub stop_loss: f64,
    /// Positive fraction, e.g. 0.06.
    pub take_profit: f64,
    pub fee_bps: f64,
    pub max_concurrent: usize,
    pub initial_capital: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 0.6,
            stop_loss: -0.03,
            take_profit: 0.06,
            fee_bps: 5.0,
            max_concurrent: 3,
            initial_capital: 10_000.0,
        }
    }
}

impl SimulatorConfig {
    pub fn fee_rate(&self) -> f64 {
        self.fee_bps / 10_000.0
    }
}

/// Which boundary closed a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub ticker: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: f64,
    /// Capital invested after the entry fee.
    pub invested: f64,
    /// Position equity at the moment of exit, before the exit fee.
    pub exit_equity: f64,
    /// Cash credited after the exit fee.
    pub proceeds: f64,
    pub return_since_entry: f64,
    pub exit_reason: ExitReason,
}

/// Output of [`run_simulation`].
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub daily: DailyResult,
    pub trades: Vec<ClosedTrade>,
    /// Portfolio after the last date; positions still open are not closed.
    pub final_state: PortfolioState,
}

/// Simulate the capital-managed long-only strategy over the whole panel.
pub fn run_simulation(panel: &Panel, config: &SimulatorConfig) -> SimulationRun {
    let fee_rate = config.fee_rate();
    let mut state = PortfolioState::new(config.initial_capital);
    let mut points = Vec::with_capacity(panel.date_count());
    let mut trades = Vec::new();
    let mut previous_equity: Option<f64> = None;

    for day in panel.days() {
        // 1. Mark and evaluate exits.
        let realized: HashMap<&str, f64> = day
            .rows
            .iter()
            .filter_map(|r| r.next_period_return.map(|ret| (r.ticker.as_str(), ret)))
            .collect();

        let mut exits: Vec<(String, ExitReason)> = Vec::new();
        for (ticker, position) in state.positions.iter_mut() {
            let Some(&ret) = realized.get(ticker.as_str()) else {
                continue;
            };
            position.mark(ret);
            let since_entry = position.return_since_entry();
            if since_entry <= config.stop_loss {
                exits.push((ticker.clone(), ExitReason::StopLoss));
            } else if since_entry >= config.take_profit {
                exits.push((ticker.clone(), ExitReason::TakeProfit));
            }
        }

        // 2. Close flagged positions.
        for (ticker, reason) in exits {
            if let Some((position, proceeds)) = state.close(&ticker, fee_rate) {
                debug!(date = %day.date, %ticker, ?reason, proceeds, "closed position");
                trades.push(ClosedTrade {
                    return_since_entry: position.return_since_entry(),
                    invested: position.cost_basis(),
                    exit_equity: position.equity,
                    ticker: position.ticker,
                    entry_date: position.entry_date,
                    exit_date: day.date,
                    entry_price: position.entry_price,
                    quantity: position.quantity,
                    proceeds,
                    exit_reason: reason,
                });
            }
        }

        // 3. Open new positions in the free slots.
        let slots = config.max_concurrent.saturating_sub(state.open_count());
        let entries: Vec<usize> = rank_descending(day.rows)
            .into_iter()
            .filter(|&i| {
                let row = &day.rows[i];
                row.probability >= config.buy_threshold && !state.holds(&row.ticker)
            })
            .take(slots)
            .collect();

        if !entries.is_empty() {
            let allocation = state.cash / entries.len() as f64;
            if allocation > 0.0 {
                for i in entries {
                    let row = &day.rows[i];
                    state.open(&row.ticker, day.date, row.price, allocation, fee_rate);
                    debug!(date = %day.date, ticker = %row.ticker, allocation, "opened position");
                }
            }
        }

        // 4. Snapshot equity.
        let equity = state.total_equity();

        // 5. Derive the daily return.
        let strategy_return = match previous_equity {
            Some(prev) if prev != 0.0 => equity / prev - 1.0,
            _ => 0.0,
        };
        previous_equity = Some(equity);

        points.push(DailyPoint {
            date: day.date,
            strategy_return,
            equity,
        });
    }

    SimulationRun {
        daily: DailyResult::new(points),
        trades,
        final_state: state,
    }
}
