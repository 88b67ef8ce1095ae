//! PredLab CLI — run, kpis and synthetic commands.
//!
//! Commands:
//! - `run` — backtest every strategy on the predictions named by a TOML config
//! - `kpis` — recompute the KPI report from an exported daily CSV
//! - `synthetic` — write a deterministic synthetic predictions file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use predlab_runner::data_loader::SYNTHETIC_PROBABILITY_COLUMN;
use predlab_runner::{
    generate_synthetic_panel, load_daily_csv, run_from_config, save_artifacts,
    write_predictions_csv, write_predictions_parquet, KpiReport, RunReport, SimulationConfig,
};

#[derive(Parser)]
#[command(
    name = "predlab",
    about = "PredLab CLI — probability-driven backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all strategies from a TOML config file and save artifacts.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Predictions file (CSV or parquet). Overrides `paths.predictions`.
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Artifact directory. Defaults to `paths.backtests_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Run strategies one after another instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Compute KPIs from a daily CSV (Date, strategy_ret[, equity]).
    Kpis {
        /// Path to the daily CSV.
        #[arg(long)]
        daily: PathBuf,
    },
    /// Generate a synthetic predictions file.
    Synthetic {
        /// Output path; a `.parquet` extension writes parquet, anything else CSV.
        #[arg(long)]
        out: PathBuf,

        /// Number of tickers.
        #[arg(long, default_value_t = 20)]
        tickers: usize,

        /// Number of business days.
        #[arg(long, default_value_t = 504)]
        days: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "predlab=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            predictions,
            output_dir,
            sequential,
        } => run_cmd(config, predictions, output_dir, sequential),
        Commands::Kpis { daily } => run_kpis(daily),
        Commands::Synthetic {
            out,
            tickers,
            days,
            seed,
        } => run_synthetic(out, tickers, days, seed),
    }
}

fn run_cmd(
    config_path: PathBuf,
    predictions: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    sequential: bool,
) -> Result<()> {
    let config = SimulationConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    info!(config = %config_path.display(), "loaded config");

    let report = run_from_config(&config, predictions.as_deref(), !sequential)?;
    print_summary(&report);

    let output_dir = output_dir.unwrap_or_else(|| config.paths.backtests_dir.clone());
    let run_dir = save_artifacts(&report, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_kpis(path: PathBuf) -> Result<()> {
    let daily = load_daily_csv(&path)
        .with_context(|| format!("failed to load daily series {}", path.display()))?;
    let kpis = KpiReport::compute(&daily);

    println!("Periods:        {}", daily.len());
    println!("CAGR:           {}", kpis.cagr);
    println!("Sharpe:         {}", kpis.sharpe);
    println!("MaxDrawdown:    {}", kpis.max_drawdown);
    println!("TotalReturn:    {}", kpis.total_return);
    Ok(())
}

fn run_synthetic(out: PathBuf, tickers: usize, days: usize, seed: u64) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let panel = generate_synthetic_panel(tickers, days, seed);
    let is_parquet = out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_predictions_parquet(&panel, SYNTHETIC_PROBABILITY_COLUMN, &out)?;
    } else {
        write_predictions_csv(&panel, SYNTHETIC_PROBABILITY_COLUMN, &out)?;
    }

    println!(
        "Wrote {} rows ({} tickers x {} days) to {}",
        panel.len(),
        tickers,
        panel.date_count(),
        out.display()
    );
    Ok(())
}

fn print_summary(report: &RunReport) {
    let fmt_date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    };

    println!();
    println!("=== Backtest Summary ===");
    println!("Probability:    {}", report.probability_column);
    println!(
        "Period:         {} to {}",
        fmt_date(report.first_date),
        fmt_date(report.last_date)
    );
    println!(
        "Rows:           {} over {} dates ({} skipped)",
        report.row_count, report.date_count, report.skipped_rows
    );
    println!("Dataset hash:   {}", report.dataset_hash);
    println!();
    println!(
        "{:<22} {:>10} {:>10} {:>12} {:>12}",
        "strategy", "CAGR", "Sharpe", "MaxDrawdown", "TotalReturn"
    );
    for row in report.summary() {
        println!(
            "{:<22} {:>10.4} {:>10.4} {:>12.4} {:>12.4}",
            row.strategy, row.cagr, row.sharpe, row.max_drawdown, row.total_return
        );
    }
    for run in &report.runs {
        if !run.trades.is_empty() {
            println!("{}: {} closed trades", run.strategy, run.trades.len());
        }
    }
    println!();
}
