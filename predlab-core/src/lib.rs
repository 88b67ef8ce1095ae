//! PredLab Core — engine for turning model probabilities into trading performance.
//!
//! This crate contains the backtesting engine and nothing that touches I/O:
//! - Domain types (prediction rows, the date-indexed panel, positions, portfolio state,
//!   daily return/equity series)
//! - Cross-sectional selector (ranking, thresholds, concurrency cap)
//! - Vectorized equal-weight backtester (long-only and long-short)
//! - Event-driven portfolio simulator with stop-loss / take-profit exits

pub mod backtest;
pub mod domain;
pub mod selector;

pub use backtest::{
    run_long_only, run_long_short, run_simulation, run_vectorized, Aggregation, ClosedTrade,
    ExitReason, SimulationRun, SimulatorConfig, VectorizedConfig,
};
pub use domain::{DailyPoint, DailyResult, Panel, PortfolioState, Position, PredictionRow};
pub use selector::{select, Selection, SelectorConfig, Side};
