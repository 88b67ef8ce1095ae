//! KPI engine — pure functions that reduce a return/equity series to scalars.
//!
//! Every metric is a pure function: series in, scalar out. Degenerate input
//! (empty series, zero volatility, non-positive bases) resolves to 0.0 and
//! never propagates NaN or infinity.

use serde::{Deserialize, Serialize};

use predlab_core::domain::{equity_curve_from_returns, DailyResult, BASE_EQUITY};

/// Trading periods per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Decimal places for return-like figures (CAGR, MaxDrawdown, TotalReturn).
pub const RETURN_DECIMALS: u32 = 6;

/// Decimal places for the Sharpe ratio.
pub const SHARPE_DECIMALS: u32 = 4;

/// Summary statistics for one strategy run, rounded for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KpiReport {
    #[serde(rename = "CAGR")]
    pub cagr: f64,
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,
    #[serde(rename = "MaxDrawdown")]
    pub max_drawdown: f64,
    #[serde(rename = "TotalReturn")]
    pub total_return: f64,
}

impl KpiReport {
    /// KPIs of a backtester's output with a zero risk-free rate.
    pub fn compute(daily: &DailyResult) -> Self {
        Self::from_series(&daily.returns(), &daily.equity(), 0.0)
    }

    /// KPIs from parallel return and equity columns.
    ///
    /// `risk_free_rate` is annual and is subtracted from the annualized mean.
    pub fn from_series(returns: &[f64], equity: &[f64], risk_free_rate: f64) -> Self {
        let n_periods = returns.len().max(equity.len());
        let total = total_return(equity);
        Self {
            cagr: round_to(cagr(total, n_periods), RETURN_DECIMALS),
            sharpe: round_to(sharpe_ratio(returns, risk_free_rate), SHARPE_DECIMALS),
            max_drawdown: round_to(max_drawdown(equity), RETURN_DECIMALS),
            total_return: round_to(total, RETURN_DECIMALS),
        }
    }

    /// KPIs from returns alone; equity is rebuilt by compounding from [`BASE_EQUITY`].
    pub fn from_returns(returns: &[f64]) -> Self {
        let equity = equity_curve_from_returns(returns, BASE_EQUITY);
        Self::from_series(returns, &equity, 0.0)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// `equity[last] / equity[first] - 1`.
pub fn total_return(equity: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (equity.first(), equity.last()) else {
        return 0.0;
    };
    if first == 0.0 {
        return 0.0;
    }
    finite_or_zero(last / first - 1.0)
}

/// Compound annual growth rate implied by `total_return` over `n_periods`.
///
/// `(1 + total_return)^(252 / n_periods) - 1`. Returns 0.0 for zero periods
/// or when the growth base is negative (no real root).
pub fn cagr(total_return: f64, n_periods: usize) -> f64 {
    if n_periods == 0 {
        return 0.0;
    }
    let years = n_periods as f64 / PERIODS_PER_YEAR;
    if years <= 0.0 {
        return 0.0;
    }
    finite_or_zero((1.0 + total_return).powf(1.0 / years) - 1.0)
}

/// Annualized Sharpe ratio.
///
/// `(mean * 252 - rf) / (population_std * sqrt(252))`. Returns 0.0 for an
/// empty series or zero volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let std = population_std(returns);
    if std < 1e-15 {
        return 0.0;
    }
    let annual_mean = mean_f64(returns) * PERIODS_PER_YEAR;
    finite_or_zero((annual_mean - risk_free_rate) / (std * PERIODS_PER_YEAR.sqrt()))
}

/// Maximum drawdown as a non-positive fraction (e.g. -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity never falls below its running peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &eq in equity {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = eq / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    finite_or_zero(max_dd)
}

/// Round half away from zero to `decimals` places; -0.0 becomes 0.0.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 || !rounded.is_finite() {
        0.0
    } else {
        rounded
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with divisor `n` (ddof = 0).
fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean_f64(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
