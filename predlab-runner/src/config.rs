//! Serializable run configuration, loaded from TOML.
//!
//! Every section and key is optional; missing values fall back to the
//! defaults below. `validate()` is called by the runner before any strategy
//! sees the numbers, so the engine can trust them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use predlab_core::backtest::{SimulatorConfig, VectorizedConfig};

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Full configuration of a backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub paths: PathsConfig,
    pub thresholds: ThresholdsConfig,
    pub costs: CostsConfig,
    pub risk: RiskConfig,
    pub portfolio: PortfolioConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Predictions table (`.csv` or `.parquet`).
    pub predictions: PathBuf,
    /// Directory receiving the summary, daily series and manifest.
    pub backtests_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            predictions: PathBuf::from("data/processed/predictions.csv"),
            backtests_dir: PathBuf::from("reports/backtests"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Minimum probability to go long.
    pub buy_prob: f64,
    /// Shorts need `probability <= 1 - short_prob`.
    pub short_prob: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            buy_prob: 0.6,
            short_prob: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostsConfig {
    /// Fee per unit of position change, in basis points.
    pub fee_bps: f64,
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self { fee_bps: 5.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss: -0.03,
            take_profit: 0.06,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub max_concurrent: usize,
    pub initial_capital: f64,
    /// Probability columns in order of preference; the first one present wins.
    pub probability_columns: Vec<String>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            initial_capital: 10_000.0,
            probability_columns: vec![
                "pred_RandomForest".to_string(),
                "pred_DecisionTree".to_string(),
            ],
        }
    }
}

impl SimulationConfig {
    /// Read and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        };

        if !(0.0..=1.0).contains(&self.thresholds.buy_prob) {
            return invalid(
                "thresholds.buy_prob",
                format!("{} is outside [0, 1]", self.thresholds.buy_prob),
            );
        }
        if !(0.0..=1.0).contains(&self.thresholds.short_prob) {
            return invalid(
                "thresholds.short_prob",
                format!("{} is outside [0, 1]", self.thresholds.short_prob),
            );
        }
        if !(self.costs.fee_bps >= 0.0 && self.costs.fee_bps.is_finite()) {
            return invalid(
                "costs.fee_bps",
                format!("{} must be a non-negative number", self.costs.fee_bps),
            );
        }
        if !(self.risk.stop_loss < 0.0 && self.risk.stop_loss.is_finite()) {
            return invalid("risk.stop_loss", format!("{} must be negative", self.risk.stop_loss));
        }
        if !(self.risk.take_profit > 0.0 && self.risk.take_profit.is_finite()) {
            return invalid(
                "risk.take_profit",
                format!("{} must be positive", self.risk.take_profit),
            );
        }
        if self.portfolio.max_concurrent == 0 {
            return invalid("portfolio.max_concurrent", "must be at least 1".to_string());
        }
        if !(self.portfolio.initial_capital > 0.0 && self.portfolio.initial_capital.is_finite()) {
            return invalid(
                "portfolio.initial_capital",
                format!("{} must be positive", self.portfolio.initial_capital),
            );
        }
        if self.portfolio.probability_columns.is_empty() {
            return invalid(
                "portfolio.probability_columns",
                "at least one column is required".to_string(),
            );
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash over the canonical JSON form.
    ///
    /// Identical configurations always hash the same, so two manifests with
    /// the same `config_hash` and `dataset_hash` describe reproducible runs.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn long_only(&self) -> VectorizedConfig {
        VectorizedConfig::long_only(
            self.thresholds.buy_prob,
            self.costs.fee_bps,
            self.portfolio.max_concurrent,
        )
    }

    pub fn long_short(&self) -> VectorizedConfig {
        VectorizedConfig::long_short(
            self.thresholds.buy_prob,
            self.thresholds.short_prob,
            self.costs.fee_bps,
            self.portfolio.max_concurrent,
        )
    }

    pub fn simulator(&self) -> SimulatorConfig {
        SimulatorConfig {
            buy_threshold: self.thresholds.buy_prob,
            stop_loss: self.risk.stop_loss,
            take_profit: self.risk.take_profit,
            fee_bps: self.costs.fee_bps,
            max_concurrent: self.portfolio.max_concurrent,
            initial_capital: self.portfolio.initial_capital,
        }
    }
}
