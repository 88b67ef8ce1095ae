//! Reporting and export — CSV, JSON and Markdown artifact generation.
//!
//! A run directory holds:
//! - `summary.csv`: one KPI row per strategy
//! - `<strategy>_daily.csv`: the date/return/equity series of each strategy
//! - `long_only_sl_tp_trades.csv`: round trips closed by the simulator
//! - `manifest.json`: config, hashes and panel shape for reproducibility
//! - `report.md`: human-readable summary
//!
//! The manifest carries a `schema_version`. Unknown versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use predlab_core::backtest::{ClosedTrade, ExitReason};
use predlab_core::domain::DailyResult;

use crate::config::SimulationConfig;
use crate::runner::{RunReport, StrategyKind, SummaryRow, SCHEMA_VERSION};

/// Provenance of a run, persisted as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: SimulationConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub probability_column: String,
    pub row_count: usize,
    pub date_count: usize,
    pub skipped_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub strategies: Vec<SummaryRow>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunManifest {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config: report.config.clone(),
            config_hash: report.config_hash.clone(),
            dataset_hash: report.dataset_hash.clone(),
            probability_column: report.probability_column.clone(),
            row_count: report.row_count,
            date_count: report.date_count,
            skipped_rows: report.skipped_rows,
            first_date: report.first_date,
            last_date: report.last_date,
            strategies: report.summary(),
        }
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: strategy, CAGR, Sharpe, MaxDrawdown, TotalReturn.
pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    if rows.is_empty() {
        wtr.write_record(["strategy", "CAGR", "Sharpe", "MaxDrawdown", "TotalReturn"])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: Date, strategy_ret, equity.
pub fn export_daily_csv(daily: &DailyResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "strategy_ret", "equity"])?;
    for p in daily.points() {
        wtr.write_record([
            p.date.to_string(),
            p.strategy_return.to_string(),
            p.equity.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the simulator's closed round trips.
///
/// Columns: ticker, entry_date, exit_date, entry_price, quantity, invested,
/// exit_equity, proceeds, return_since_entry, exit_reason
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "entry_date",
        "exit_date",
        "entry_price",
        "quantity",
        "invested",
        "exit_equity",
        "proceeds",
        "return_since_entry",
        "exit_reason",
    ])?;
    for t in trades {
        let reason = match t.exit_reason {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
        };
        wtr.write_record([
            t.ticker.as_str(),
            &t.entry_date.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.quantity),
            &format!("{:.2}", t.invested),
            &format!("{:.2}", t.exit_equity),
            &format!("{:.2}", t.proceeds),
            &format!("{:.6}", t.return_since_entry),
            reason,
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Summary table as Markdown.
pub fn generate_summary_report(manifest: &RunManifest) -> String {
    let mut md = String::with_capacity(1024);
    md.push_str("# Backtest Summary\n\n");

    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    let period = match (manifest.first_date, manifest.last_date) {
        (Some(a), Some(b)) => format!("{a} to {b}"),
        _ => "empty".to_string(),
    };
    md.push_str(&format!("| Period | {period} |\n"));
    md.push_str(&format!(
        "| Rows | {} ({} dates, {} skipped) |\n",
        manifest.row_count, manifest.date_count, manifest.skipped_rows
    ));
    md.push_str(&format!("| Probability Column | {} |\n", manifest.probability_column));
    md.push_str(&format!("| Dataset Hash | {} |\n", manifest.dataset_hash));
    md.push_str(&format!("| Config Hash | {} |\n", manifest.config_hash));
    md.push('\n');

    md.push_str("| Strategy | CAGR | Sharpe | Max Drawdown | Total Return |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: |\n");
    for row in &manifest.strategies {
        md.push_str(&format!(
            "| {} | {:.2}% | {:.2} | {:.2}% | {:.2}% |\n",
            row.strategy,
            row.cagr * 100.0,
            row.sharpe,
            row.max_drawdown * 100.0,
            row.total_return * 100.0
        ));
    }
    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set for a run into `output_dir` and return it.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    let manifest = RunManifest::from_report(report);

    write_artifact(output_dir, "summary.csv", &export_summary_csv(&manifest.strategies)?)?;

    for run in &report.runs {
        let name = format!("{}_daily.csv", run.strategy.name());
        write_artifact(output_dir, &name, &export_daily_csv(&run.daily)?)?;
        if run.strategy == StrategyKind::LongOnlySlTp {
            let name = format!("{}_trades.csv", run.strategy.name());
            write_artifact(output_dir, &name, &export_trades_csv(&run.trades)?)?;
        }
    }

    let json = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    write_artifact(output_dir, "manifest.json", &json)?;
    write_artifact(output_dir, "report.md", &generate_summary_report(&manifest))?;

    Ok(output_dir.to_path_buf())
}

fn write_artifact(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote artifact");
    Ok(())
}

/// Load `manifest.json` from an artifact directory, rejecting unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: RunManifest =
        serde_json::from_str(&json).context("failed to deserialize manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}
