//! Predictions loading and synthetic panel generation.
//!
//! The predictions table has one row per (date, ticker) with columns
//! `Date, ticker, price, <probability column>, target_return_1d`. The
//! probability column name depends on which model produced the file, so the
//! loader takes a preference list and uses the first column present:
//! 1. CSV files are read with `csv`, parquet files with `polars`
//! 2. Rows with an empty price or probability are skipped with a warning
//! 3. Rows with present but invalid values fail the load with their index
//! 4. The resulting panel is checked for duplicate (date, ticker) pairs
//!
//! An empty or `NaN` return means the next period has not been realized yet.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use predlab_core::domain::{
    DailyPoint, DailyResult, Panel, PanelError, PredictionRow, RowError, BASE_EQUITY,
};

pub const DATE_COLUMN: &str = "Date";
pub const TICKER_COLUMN: &str = "ticker";
pub const PRICE_COLUMN: &str = "price";
pub const RETURN_COLUMN: &str = "target_return_1d";

/// Column name used when writing synthetic predictions.
pub const SYNTHETIC_PROBABILITY_COLUMN: &str = "pred_RandomForest";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("none of the probability columns [{}] is present", candidates.join(", "))]
    NoProbabilityColumn { candidates: Vec<String> },

    #[error("row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: RowError,
    },

    #[error(transparent)]
    Panel(#[from] PanelError),
}

/// A loaded predictions panel plus provenance for the run manifest.
#[derive(Debug, Clone)]
pub struct LoadedPanel {
    pub panel: Panel,
    /// The probability column actually used.
    pub probability_column: String,
    /// BLAKE3 over the sorted rows.
    pub dataset_hash: String,
    /// Rows dropped because price or probability was empty.
    pub skipped_rows: usize,
}

/// One raw row before validation; `None` means the cell was empty.
struct RawRow {
    date: NaiveDate,
    ticker: String,
    price: Option<f64>,
    probability: Option<f64>,
    next_period_return: Option<f64>,
}

/// Load a predictions table from CSV or parquet (chosen by extension).
pub fn load_predictions(
    path: impl AsRef<Path>,
    probability_columns: &[String],
) -> Result<LoadedPanel, LoadError> {
    let path = path.as_ref();
    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));

    let (probability_column, raw) = if is_parquet {
        read_parquet_rows(path, probability_columns)?
    } else {
        read_csv_rows(path, probability_columns)?
    };

    let mut rows = Vec::with_capacity(raw.len());
    let mut skipped_rows = 0;
    for (i, r) in raw.into_iter().enumerate() {
        let (Some(price), Some(probability)) = (r.price, r.probability) else {
            skipped_rows += 1;
            continue;
        };
        let row = PredictionRow::new(r.date, r.ticker, price, probability, r.next_period_return);
        row.validate()
            .map_err(|source| LoadError::InvalidRow { row: i, source })?;
        rows.push(row);
    }
    if skipped_rows > 0 {
        warn!(
            path = %path.display(),
            skipped_rows,
            "skipped rows with empty price or probability"
        );
    }

    let panel = Panel::new(rows);
    panel.check_unique()?;
    let dataset_hash = compute_dataset_hash(&panel);

    info!(
        path = %path.display(),
        rows = panel.len(),
        dates = panel.date_count(),
        probability_column = %probability_column,
        "loaded predictions"
    );

    Ok(LoadedPanel {
        panel,
        probability_column,
        dataset_hash,
        skipped_rows,
    })
}

/// Pick the first preferred probability column that exists.
pub fn resolve_probability_column(
    available: &[&str],
    preferences: &[String],
) -> Result<String, LoadError> {
    for (rank, candidate) in preferences.iter().enumerate() {
        if available.contains(&candidate.as_str()) {
            if rank > 0 {
                warn!(
                    preferred = %preferences[0],
                    using = %candidate,
                    "preferred probability column missing, falling back"
                );
            }
            return Ok(candidate.clone());
        }
    }
    Err(LoadError::NoProbabilityColumn {
        candidates: preferences.to_vec(),
    })
}

// ── CSV ─────────────────────────────────────────────────────────────

fn read_csv_rows(
    path: &Path,
    probability_columns: &[String],
) -> Result<(String, Vec<RawRow>), LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let header_names: Vec<&str> = headers.iter().collect();
    let probability_column = resolve_probability_column(&header_names, probability_columns)?;
    let index_of = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };
    let date_idx = index_of(DATE_COLUMN)?;
    let ticker_idx = index_of(TICKER_COLUMN)?;
    let price_idx = index_of(PRICE_COLUMN)?;
    let prob_idx = index_of(&probability_column)?;
    let ret_idx = index_of(RETURN_COLUMN)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        rows.push(RawRow {
            date: parse_date(field(date_idx), i)?,
            ticker: field(ticker_idx).to_string(),
            price: parse_optional_f64(field(price_idx), PRICE_COLUMN, i)?,
            probability: parse_optional_f64(field(prob_idx), &probability_column, i)?,
            next_period_return: parse_optional_f64(field(ret_idx), RETURN_COLUMN, i)?,
        });
    }
    Ok((probability_column, rows))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &str, row: usize) -> Result<NaiveDate, LoadError> {
    value
        .get(..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| LoadError::InvalidDate {
            row,
            value: value.to_string(),
        })
}

/// Empty cells and `NaN` read as missing.
fn parse_optional_f64(value: &str, column: &str, row: usize) -> Result<Option<f64>, LoadError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| LoadError::InvalidNumber {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

// ── Parquet ─────────────────────────────────────────────────────────

fn read_parquet_rows(
    path: &Path,
    probability_columns: &[String],
) -> Result<(String, Vec<RawRow>), LoadError> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| LoadError::Parquet(format!("read: {e}")))?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let probability_column = resolve_probability_column(&name_refs, probability_columns)?;

    let column = |name: &str| {
        df.column(name)
            .map_err(|_| LoadError::MissingColumn(name.to_string()))
    };
    let as_f64 = |name: &str| -> Result<Column, LoadError> {
        column(name)?
            .cast(&DataType::Float64)
            .map_err(|e| LoadError::Parquet(format!("{name} column type: {e}")))
    };

    let dates = decode_dates(column(DATE_COLUMN)?)?;
    let tickers = column(TICKER_COLUMN)?
        .str()
        .map_err(|e| LoadError::Parquet(format!("ticker column type: {e}")))?
        .clone();
    let prices = as_f64(PRICE_COLUMN)?;
    let probs = as_f64(&probability_column)?;
    let rets = as_f64(RETURN_COLUMN)?;
    let map_err = |e: PolarsError| LoadError::Parquet(format!("column read: {e}"));
    let price_ca = prices.f64().map_err(map_err)?;
    let prob_ca = probs.f64().map_err(map_err)?;
    let ret_ca = rets.f64().map_err(map_err)?;

    let mut rows = Vec::with_capacity(df.height());
    for (i, date) in dates.into_iter().enumerate() {
        let not_nan = |x: Option<f64>| x.filter(|v| !v.is_nan());
        rows.push(RawRow {
            date: date.ok_or_else(|| LoadError::InvalidDate {
                row: i,
                value: "null".to_string(),
            })?,
            ticker: tickers.get(i).unwrap_or_default().to_string(),
            price: not_nan(price_ca.get(i)),
            probability: not_nan(prob_ca.get(i)),
            next_period_return: not_nan(ret_ca.get(i)),
        });
    }
    Ok((probability_column, rows))
}

/// String dates are parsed like CSV; temporal columns are cast to `Date`.
fn decode_dates(col: &Column) -> Result<Vec<Option<NaiveDate>>, LoadError> {
    if col.dtype() == &DataType::String {
        let ca = col
            .str()
            .map_err(|e| LoadError::Parquet(format!("Date column type: {e}")))?;
        return (0..ca.len())
            .map(|i| ca.get(i).map(|s| parse_date(s, i)).transpose())
            .collect();
    }

    let cast = col
        .cast(&DataType::Date)
        .map_err(|e| LoadError::Parquet(format!("Date cast: {e}")))?;
    let ca = cast
        .date()
        .map_err(|e| LoadError::Parquet(format!("Date column type: {e}")))?;
    let epoch = unix_epoch();
    Ok((0..ca.len())
        .map(|i| ca.get(i).map(|days| epoch + chrono::Duration::days(days as i64)))
        .collect())
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::default()
}

// ── Writers ─────────────────────────────────────────────────────────

/// Write a panel as a predictions CSV with the given probability column name.
pub fn write_predictions_csv(
    panel: &Panel,
    probability_column: &str,
    path: impl AsRef<Path>,
) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record([
        DATE_COLUMN,
        TICKER_COLUMN,
        PRICE_COLUMN,
        probability_column,
        RETURN_COLUMN,
    ])?;
    for row in panel.rows() {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.ticker.clone(),
            row.price.to_string(),
            row.probability.to_string(),
            row.next_period_return
                .map(|r| r.to_string())
                .unwrap_or_default(),
        ])?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Write a panel as a predictions parquet file.
pub fn write_predictions_parquet(
    panel: &Panel,
    probability_column: &str,
    path: impl AsRef<Path>,
) -> Result<(), LoadError> {
    let epoch = unix_epoch();
    let rows = panel.rows();
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    let probs: Vec<f64> = rows.iter().map(|r| r.probability).collect();
    let rets: Vec<Option<f64>> = rows.iter().map(|r| r.next_period_return).collect();

    let mut df = DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| LoadError::Parquet(format!("date cast: {e}")))?,
        Column::new(TICKER_COLUMN.into(), tickers),
        Column::new(PRICE_COLUMN.into(), prices),
        Column::new(probability_column.into(), probs),
        Column::new(RETURN_COLUMN.into(), rets),
    ])
    .map_err(|e| LoadError::Parquet(format!("dataframe creation: {e}")))?;

    let file = fs::File::create(path.as_ref()).map_err(|source| LoadError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| LoadError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

// ── Daily series ────────────────────────────────────────────────────

/// Read a `Date,strategy_ret[,equity]` file written by the exporter.
///
/// When the equity column is absent it is rebuilt from returns starting at
/// [`BASE_EQUITY`].
pub fn load_daily_csv(path: impl AsRef<Path>) -> Result<DailyResult, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let date_idx = find(DATE_COLUMN).ok_or_else(|| LoadError::MissingColumn(DATE_COLUMN.into()))?;
    let ret_idx =
        find("strategy_ret").ok_or_else(|| LoadError::MissingColumn("strategy_ret".into()))?;
    let equity_idx = find("equity");

    let mut returns = Vec::new();
    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let date = parse_date(field(date_idx), i)?;
        let ret = parse_optional_f64(field(ret_idx), "strategy_ret", i)?.unwrap_or(0.0);
        match equity_idx {
            Some(eq_idx) => {
                let equity = parse_optional_f64(field(eq_idx), "equity", i)?.ok_or_else(|| {
                    LoadError::InvalidNumber {
                        row: i,
                        column: "equity".to_string(),
                        value: String::new(),
                    }
                })?;
                points.push(DailyPoint {
                    date,
                    strategy_return: ret,
                    equity,
                });
            }
            None => returns.push((date, ret)),
        }
    }

    Ok(match equity_idx {
        Some(_) => DailyResult::new(points),
        None => DailyResult::from_returns(returns, BASE_EQUITY),
    })
}

// ── Hashing ─────────────────────────────────────────────────────────

/// Deterministic BLAKE3 hash over every row of a (sorted) panel.
pub fn compute_dataset_hash(panel: &Panel) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in panel.rows() {
        hasher.update(row.date.to_string().as_bytes());
        hasher.update(row.ticker.as_bytes());
        hasher.update(&row.price.to_le_bytes());
        hasher.update(&row.probability.to_le_bytes());
        match row.next_period_return {
            Some(r) => {
                hasher.update(&[1]);
                hasher.update(&r.to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}

// ── Synthetic data ──────────────────────────────────────────────────

/// Generate a deterministic synthetic predictions panel.
///
/// Each ticker follows a random walk from 100.0 over `days` business days
/// starting 2020-01-02. The realized return of a row is the next price move,
/// so the last date of every ticker has none. Probabilities are noisy but
/// tilted toward the sign of the upcoming move, giving the strategies
/// something to find.
pub fn generate_synthetic_panel(tickers: usize, days: usize, seed: u64) -> Panel {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let dates = business_days(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default(), days);

    let mut rows = Vec::with_capacity(tickers * days);
    for t in 0..tickers {
        let ticker = format!("SYN{:03}", t + 1);
        let mut prices = Vec::with_capacity(days);
        let mut price = 100.0_f64;
        for _ in 0..days {
            prices.push(price);
            price *= 1.0 + rng.gen_range(-0.03..0.03);
        }

        for (d, &date) in dates.iter().enumerate() {
            let next = prices.get(d + 1).map(|p| p / prices[d] - 1.0);
            let signal = next.unwrap_or(0.0) * 8.0;
            let noise: f64 = rng.gen_range(-0.25..0.25);
            let probability = (0.5 + signal + noise).clamp(0.0, 1.0);
            rows.push(PredictionRow::new(date, ticker.clone(), prices[d], probability, next));
        }
    }
    Panel::new(rows)
}

fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = start;
    while dates.len() < count {
        if !matches!(current.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            dates.push(current);
        }
        current += chrono::Duration::days(1);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn prefs() -> Vec<String> {
        vec!["pred_RandomForest".into(), "pred_DecisionTree".into()]
    }

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_loads_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,price,pred_RandomForest,target_return_1d\n\
             2024-01-03,B,20.0,0.3,\n\
             2024-01-02,B,19.0,0.4,0.0526\n\
             2024-01-02 00:00:00,A,10.0,0.9,0.01\n",
        );
        let loaded = load_predictions(&path, &prefs()).unwrap();
        assert_eq!(loaded.probability_column, "pred_RandomForest");
        assert_eq!(loaded.panel.len(), 3);
        assert_eq!(loaded.panel.date_count(), 2);
        let first = &loaded.panel.rows()[0];
        assert_eq!(first.ticker, "A");
        assert_eq!(first.next_period_return, Some(0.01));
        assert_eq!(loaded.panel.rows()[2].next_period_return, None);
        assert_eq!(loaded.skipped_rows, 0);
    }

    #[test]
    fn falls_back_to_second_probability_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,price,pred_DecisionTree,target_return_1d\n2024-01-02,A,10.0,0.7,0.01\n",
        );
        let loaded = load_predictions(&path, &prefs()).unwrap();
        assert_eq!(loaded.probability_column, "pred_DecisionTree");
        assert_eq!(loaded.panel.rows()[0].probability, 0.7);
    }

    #[test]
    fn no_probability_column_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,price,pred_SVM,target_return_1d\n2024-01-02,A,10.0,0.7,0.01\n",
        );
        let err = load_predictions(&path, &prefs()).unwrap_err();
        assert!(matches!(err, LoadError::NoProbabilityColumn { .. }));
        assert!(err.to_string().contains("pred_RandomForest, pred_DecisionTree"));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,pred_RandomForest,target_return_1d\n2024-01-02,A,0.7,0.01\n",
        );
        let err = load_predictions(&path, &prefs()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "price"));
    }

    #[test]
    fn invalid_values_fail_with_row_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,price,pred_RandomForest,target_return_1d\n\
             2024-01-02,A,10.0,0.7,0.01\n\
             2024-01-02,B,10.0,1.7,0.01\n",
        );
        let err = load_predictions(&path, &prefs()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRow { row: 1, .. }), "{err}");

        let path = write_file(
            dir.path(),
            "q.csv",
            "Date,ticker,price,pred_RandomForest,target_return_1d\n2024-01-02,A,ten,0.7,0.01\n",
        );
        let err = load_predictions(&path, &prefs()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidNumber { row: 0, .. }), "{err}");
    }

    #[test]
    fn empty_price_or_probability_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,price,pred_RandomForest,target_return_1d\n\
             2024-01-02,A,,0.7,0.01\n\
             2024-01-02,B,10.0,NaN,0.01\n\
             2024-01-02,C,10.0,0.5,0.01\n",
        );
        let loaded = load_predictions(&path, &prefs()).unwrap();
        assert_eq!(loaded.panel.len(), 1);
        assert_eq!(loaded.skipped_rows, 2);
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "p.csv",
            "Date,ticker,price,pred_RandomForest,target_return_1d\n\
             2024-01-02,A,10.0,0.7,0.01\n\
             2024-01-02,A,10.0,0.6,0.01\n",
        );
        assert!(matches!(
            load_predictions(&path, &prefs()),
            Err(LoadError::Panel(PanelError::DuplicateRow { .. }))
        ));
    }

    #[test]
    fn parquet_and_csv_load_the_same_panel() {
        let dir = tempfile::tempdir().unwrap();
        let panel = generate_synthetic_panel(3, 10, 7);
        let csv_path = dir.path().join("p.csv");
        let pq_path = dir.path().join("p.parquet");
        write_predictions_csv(&panel, "pred_DecisionTree", &csv_path).unwrap();
        write_predictions_parquet(&panel, "pred_DecisionTree", &pq_path).unwrap();

        let from_csv = load_predictions(&csv_path, &prefs()).unwrap();
        let from_pq = load_predictions(&pq_path, &prefs()).unwrap();
        assert_eq!(from_pq.panel.rows(), panel.rows());
        assert_eq!(from_pq.dataset_hash, compute_dataset_hash(&panel));
        assert_eq!(from_csv.panel.len(), panel.len());
        assert_eq!(from_csv.panel.dates(), panel.dates());
        assert_eq!(from_pq.probability_column, "pred_DecisionTree");
    }

    #[test]
    fn synthetic_panel_is_deterministic_and_consistent() {
        let a = generate_synthetic_panel(4, 30, 42);
        let b = generate_synthetic_panel(4, 30, 42);
        let c = generate_synthetic_panel(4, 30, 43);
        assert_eq!(a.rows(), b.rows());
        assert_ne!(compute_dataset_hash(&a), compute_dataset_hash(&c));
        assert_eq!(a.len(), 120);
        assert_eq!(a.tickers().len(), 4);

        for date in a.dates() {
            assert!(!matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun));
        }
        let last = a.last_date().unwrap();
        for row in a.rows() {
            assert!((0.0..=1.0).contains(&row.probability));
            assert_eq!(row.next_period_return.is_none(), row.date == last);
            assert!(row.validate().is_ok());
        }
    }

    #[test]
    fn daily_csv_rebuilds_missing_equity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "d.csv",
            "Date,strategy_ret\n2024-01-02,0.01\n2024-01-03,-0.02\n",
        );
        let daily = load_daily_csv(&path).unwrap();
        assert_eq!(daily.len(), 2);
        assert!((daily.equity()[0] - 10_100.0).abs() < 1e-9);
        assert!((daily.equity()[1] - 10_100.0 * 0.98).abs() < 1e-9);
    }

    #[test]
    fn daily_csv_keeps_supplied_equity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "d.csv",
            "Date,strategy_ret,equity\n2024-01-02,0.0,500.0\n2024-01-03,0.1,550.0\n",
        );
        let daily = load_daily_csv(&path).unwrap();
        assert_eq!(daily.equity(), vec![500.0, 550.0]);
        assert_eq!(daily.returns(), vec![0.0, 0.1]);
    }
}
