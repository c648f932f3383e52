//! Derived statistics — pure functions over the equity series.
//!
//! Deterministic, computed once at finalize time. 252 trading days per year
//! for annualization.

const TRADING_DAYS: f64 = 252.0;

/// Per-step simple returns from an equity curve.
pub fn returns(equity: &[f64]) -> Vec<f64> {
    if equity.len() < 2 {
        return Vec::new();
    }
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Total return as a fraction: (final - initial) / initial.
pub fn cumulative_return(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let initial = equity[0];
    if initial <= 0.0 {
        return 0.0;
    }
    (equity[equity.len() - 1] - initial) / initial
}

/// Annualized volatility of the return series: std * sqrt(252).
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * TRADING_DAYS.sqrt()
}

/// Annualized Sharpe-like ratio from per-step returns.
///
/// Sharpe = mean(returns - rf) / std(returns) * sqrt(252).
/// Returns 0.0 for zero variance or fewer than 2 rows.
pub fn sharpe_ratio(equity: &[f64], risk_free_rate: f64) -> f64 {
    let rets = returns(equity);
    if rets.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS;
    let excess: Vec<f64> = rets.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean(&excess) / std) * TRADING_DAYS.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let mut peak = equity[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
