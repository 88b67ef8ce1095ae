//! PredLab Runner — strategy orchestration, KPIs, configuration, loading, export.
//!
//! This crate builds on `predlab-core` to provide:
//! - TOML configuration with defaults, validation and a content hash
//! - Predictions loading from CSV or parquet, plus a synthetic panel generator
//! - The KPI engine (CAGR, Sharpe, max drawdown, total return)
//! - Parallel execution of the three strategy variants
//! - CSV/JSON/Markdown artifact export with a run manifest

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, SimulationConfig};
pub use data_loader::{
    generate_synthetic_panel, load_daily_csv, load_predictions, write_predictions_csv,
    write_predictions_parquet, LoadError, LoadedPanel,
};
pub use export::{load_manifest, save_artifacts, RunManifest};
pub use metrics::KpiReport;
pub use runner::{
    run_all, run_from_config, run_strategy, summary_rows, RunError, RunReport, StrategyKind,
    StrategyRun, SummaryRow, SCHEMA_VERSION,
};
