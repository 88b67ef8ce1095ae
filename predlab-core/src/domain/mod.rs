//! Domain types for the prediction backtester

pub mod daily;
pub mod panel;
pub mod portfolio;
pub mod position;
pub mod row;

pub use daily::{equity_curve_from_returns, DailyPoint, DailyResult, BASE_EQUITY};
pub use panel::{Panel, PanelDay, PanelError};
pub use portfolio::PortfolioState;
pub use position::Position;
pub use row::{PredictionRow, RowError};
