//! Strategy runner — wires together configuration, loading, engines and KPIs.
//!
//! Two entry points:
//! - `run_all()`: runs every strategy on a pre-loaded panel. No I/O.
//! - `run_from_config()`: loads the predictions named by the config, then
//!   runs. Used by the CLI.
//!
//! Strategy runs are independent: each one owns its engine state and reads
//! the shared panel immutably, so they can execute on a rayon pool.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use predlab_core::backtest::{run_simulation, run_vectorized, ClosedTrade};
use predlab_core::domain::{DailyResult, Panel};

use crate::config::{ConfigError, SimulationConfig};
use crate::data_loader::{load_predictions, LoadError};
use crate::metrics::KpiReport;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// The three strategy variants, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Vectorized, long the top names above the buy threshold, universe mean.
    LongOnlyThreshold,
    /// Vectorized, long the top and short the bottom, mean over held names.
    LongShortThreshold,
    /// Event-driven, capital-managed with stop-loss and take-profit exits.
    LongOnlySlTp,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::LongOnlyThreshold,
        StrategyKind::LongShortThreshold,
        StrategyKind::LongOnlySlTp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::LongOnlyThreshold => "long_only_threshold",
            StrategyKind::LongShortThreshold => "long_short_threshold",
            StrategyKind::LongOnlySlTp => "long_only_sl_tp",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| RunError::UnknownStrategy(s.to_string()))
    }
}

/// Output of one strategy over one panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRun {
    pub strategy: StrategyKind,
    pub daily: DailyResult,
    pub kpis: KpiReport,
    /// Closed round trips; empty for the vectorized strategies.
    pub trades: Vec<ClosedTrade>,
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub strategy: String,
    #[serde(rename = "CAGR")]
    pub cagr: f64,
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,
    #[serde(rename = "MaxDrawdown")]
    pub max_drawdown: f64,
    #[serde(rename = "TotalReturn")]
    pub total_return: f64,
}

/// Everything one configured run produced, plus its provenance.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub config: SimulationConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub probability_column: String,
    pub row_count: usize,
    pub date_count: usize,
    pub skipped_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub runs: Vec<StrategyRun>,
}

impl RunReport {
    pub fn summary(&self) -> Vec<SummaryRow> {
        summary_rows(&self.runs)
    }
}

/// Run one strategy on a pre-loaded panel.
pub fn run_strategy(kind: StrategyKind, panel: &Panel, config: &SimulationConfig) -> StrategyRun {
    let (daily, trades) = match kind {
        StrategyKind::LongOnlyThreshold => (run_vectorized(panel, &config.long_only()), Vec::new()),
        StrategyKind::LongShortThreshold => {
            (run_vectorized(panel, &config.long_short()), Vec::new())
        }
        StrategyKind::LongOnlySlTp => {
            let sim = run_simulation(panel, &config.simulator());
            (sim.daily, sim.trades)
        }
    };
    let kpis = KpiReport::compute(&daily);

    info!(
        strategy = kind.name(),
        dates = daily.len(),
        trades = trades.len(),
        total_return = kpis.total_return,
        sharpe = kpis.sharpe,
        "strategy finished"
    );

    StrategyRun {
        strategy: kind,
        daily,
        kpis,
        trades,
    }
}

/// Run every strategy, in parallel when `parallel` is set.
///
/// Results come back in [`StrategyKind::ALL`] order either way.
pub fn run_all(panel: &Panel, config: &SimulationConfig, parallel: bool) -> Vec<StrategyRun> {
    if parallel {
        StrategyKind::ALL
            .par_iter()
            .map(|&kind| run_strategy(kind, panel, config))
            .collect()
    } else {
        StrategyKind::ALL
            .iter()
            .map(|&kind| run_strategy(kind, panel, config))
            .collect()
    }
}

pub fn summary_rows(runs: &[StrategyRun]) -> Vec<SummaryRow> {
    runs.iter()
        .map(|run| SummaryRow {
            strategy: run.strategy.name().to_string(),
            cagr: run.kpis.cagr,
            sharpe: run.kpis.sharpe,
            max_drawdown: run.kpis.max_drawdown,
            total_return: run.kpis.total_return,
        })
        .collect()
}

/// Validate the config, load its predictions (or `predictions_override`)
/// and run every strategy.
pub fn run_from_config(
    config: &SimulationConfig,
    predictions_override: Option<&Path>,
    parallel: bool,
) -> Result<RunReport, RunError> {
    config.validate()?;
    let config_hash = config.config_hash()?;
    let path = predictions_override.unwrap_or(config.paths.predictions.as_path());
    let loaded = load_predictions(path, &config.portfolio.probability_columns)?;

    info!(
        config_hash = %config_hash,
        dataset_hash = %loaded.dataset_hash,
        parallel,
        "running strategies"
    );
    let runs = run_all(&loaded.panel, config, parallel);

    Ok(RunReport {
        config: config.clone(),
        config_hash,
        dataset_hash: loaded.dataset_hash,
        probability_column: loaded.probability_column,
        row_count: loaded.panel.len(),
        date_count: loaded.panel.date_count(),
        skipped_rows: loaded.skipped_rows,
        first_date: loaded.panel.first_date(),
        last_date: loaded.panel.last_date(),
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_panel;

    #[test]
    fn strategy_names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.name().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
        assert!(matches!(
            "buy_and_hold".parse::<StrategyKind>(),
            Err(RunError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn serde_name_matches_display() {
        let json = serde_json::to_string(&StrategyKind::LongOnlySlTp).unwrap();
        assert_eq!(json, "\"long_only_sl_tp\"");
    }

    #[test]
    fn run_all_preserves_order_and_dates() {
        let panel = generate_synthetic_panel(6, 40, 11);
        let runs = run_all(&panel, &SimulationConfig::default(), true);
        let kinds: Vec<StrategyKind> = runs.iter().map(|r| r.strategy).collect();
        assert_eq!(kinds, StrategyKind::ALL.to_vec());
        for run in &runs {
            assert_eq!(run.daily.dates(), panel.dates());
        }
        assert!(runs[0].trades.is_empty());
        assert!(runs[1].trades.is_empty());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let panel = generate_synthetic_panel(8, 60, 3);
        let config = SimulationConfig::default();
        let par = run_all(&panel, &config, true);
        let seq = run_all(&panel, &config, false);
        for (a, b) in par.iter().zip(&seq) {
            assert_eq!(a.daily, b.daily);
            assert_eq!(a.kpis, b.kpis);
            assert_eq!(a.trades, b.trades);
        }
    }

    #[test]
    fn summary_rows_follow_runs() {
        let panel = generate_synthetic_panel(3, 20, 5);
        let runs = run_all(&panel, &SimulationConfig::default(), false);
        let rows = summary_rows(&runs);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].strategy, "long_only_sl_tp");
        assert_eq!(rows[0].sharpe, runs[0].kpis.sharpe);
    }

    #[test]
    fn empty_panel_gives_zero_kpis() {
        let runs = run_all(&Panel::default(), &SimulationConfig::default(), false);
        for run in runs {
            assert!(run.daily.is_empty());
            assert_eq!(run.kpis, KpiReport::default());
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let mut config = SimulationConfig::default();
        config.portfolio.max_concurrent = 0;
        config.paths.predictions = "/nonexistent/predictions.csv".into();
        assert!(matches!(
            run_from_config(&config, None, false),
            Err(RunError::Config(_))
        ));
    }
}
