//! Backtesters. Both styles produce the same [`DailyResult`](crate::domain::DailyResult) contract.

pub mod simulator;
pub mod vectorized;

pub use simulator::{run_simulation, ClosedTrade, ExitReason, SimulationRun, SimulatorConfig};
pub use vectorized::{
    run_long_only, run_long_short, run_vectorized, Aggregation, RowContribution, VectorizedConfig,
};
