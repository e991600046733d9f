//! Performance report derived from a trade ledger.
//!
//! All percentages are whole-number scaled (12.5 means 12.5%). Every ratio
//! short-circuits to 0 when its denominator is 0, so a report never carries
//! NaN or infinity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::position::{ExitReason, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: f64,
    /// Percent below the running equity peak.
    pub drawdown_from_peak: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub strategy_id: String,
    pub strategy_name: String,
    pub start_date: i64,
    pub end_date: i64,

    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_profit_loss: f64,
    pub total_return_percent: f64,

    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,

    pub gross_profit: f64,
    pub gross_loss: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,

    pub max_drawdown: f64,
    pub max_drawdown_duration_secs: i64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub profit_factor: f64,

    pub average_hold_time_secs: f64,
    pub longest_winning_streak: usize,
    pub longest_losing_streak: usize,

    pub exit_reasons: BTreeMap<ExitReason, usize>,
    pub equity_curve: Vec<EquityPoint>,
}

pub fn aggregate(
    trades: &[Trade],
    initial_capital: f64,
    strategy_id: &str,
    strategy_name: &str,
    start_date: i64,
    end_date: i64,
) -> PerformanceReport {
    let ordered = by_exit_time(trades);

    let mut winning_trades = 0usize;
    let mut losing_trades = 0usize;
    let mut breakeven_trades = 0usize;
    let mut gross_profit = 0.0_f64;
    let mut gross_loss = 0.0_f64;
    let mut largest_win = 0.0_f64;
    let mut largest_loss = 0.0_f64;
    let mut total_hold_secs = 0i64;
    let mut exit_reasons = BTreeMap::new();

    for trade in &ordered {
        let pnl = trade.profit_loss;
        if pnl > 0.0 {
            winning_trades += 1;
            gross_profit += pnl;
            largest_win = largest_win.max(pnl);
        } else if pnl < 0.0 {
            losing_trades += 1;
            gross_loss += pnl.abs();
            largest_loss = largest_loss.max(pnl.abs());
        } else {
            breakeven_trades += 1;
        }
        total_hold_secs = total_hold_secs.saturating_add(trade.hold_time_secs);
        *exit_reasons.entry(trade.exit_reason).or_insert(0) += 1;
    }

    let total_trades = ordered.len();
    let total_profit_loss: f64 = ordered.iter().map(|t| t.profit_loss).sum();
    let final_capital = initial_capital + total_profit_loss;

    let equity_curve = build_equity_curve(&ordered, initial_capital);
    let (max_drawdown, max_drawdown_duration_secs) =
        compute_drawdown(&equity_curve, initial_capital, start_date);

    let returns: Vec<f64> = ordered.iter().map(|t| t.profit_loss_percent).collect();
    let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&returns);
    let (longest_winning_streak, longest_losing_streak) = compute_streaks(&ordered);

    PerformanceReport {
        strategy_id: strategy_id.to_string(),
        strategy_name: strategy_name.to_string(),
        start_date,
        end_date,
        initial_capital,
        final_capital,
        total_profit_loss,
        total_return_percent: safe_div(total_profit_loss, initial_capital) * 100.0,
        total_trades,
        winning_trades,
        losing_trades,
        breakeven_trades,
        win_rate: safe_div(winning_trades as f64, total_trades as f64) * 100.0,
        gross_profit,
        gross_loss,
        average_win: safe_div(gross_profit, winning_trades as f64),
        average_loss: safe_div(gross_loss, losing_trades as f64),
        largest_win,
        largest_loss,
        max_drawdown,
        max_drawdown_duration_secs,
        sharpe_ratio,
        sortino_ratio,
        profit_factor: safe_div(gross_profit, gross_loss),
        average_hold_time_secs: safe_div(total_hold_secs as f64, total_trades as f64),
        longest_winning_streak,
        longest_losing_streak,
        exit_reasons,
        equity_curve,
    }
}

/// Stable sort by exit time; ties keep ledger order.
fn by_exit_time(trades: &[Trade]) -> Vec<&Trade> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.exit_time);
    ordered
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

fn build_equity_curve(ordered: &[&Trade], initial_capital: f64) -> Vec<EquityPoint> {
    let mut equity = initial_capital;
    let mut peak = initial_capital;

    ordered
        .iter()
        .map(|trade| {
            equity += trade.profit_loss;
            peak = peak.max(equity);
            EquityPoint {
                timestamp: trade.exit_time,
                equity,
                drawdown_from_peak: safe_div(peak - equity, peak) * 100.0,
            }
        })
        .collect()
}

/// Largest percent drop from a running peak, and how long (seconds) equity
/// stayed below that peak. An unrecovered drawdown runs to the last point.
fn compute_drawdown(curve: &[EquityPoint], initial_capital: f64, start: i64) -> (f64, i64) {
    let Some(last) = curve.last() else {
        return (0.0, 0);
    };

    let mut peak = initial_capital;
    let mut peak_time = start.min(curve[0].timestamp);
    let mut max_dd = 0.0_f64;
    let mut max_dd_peak: Option<(f64, i64)> = None;

    for point in curve {
        if point.equity > peak {
            peak = point.equity;
            peak_time = point.timestamp;
        }
        let dd = safe_div(peak - point.equity, peak) * 100.0;
        if dd > max_dd {
            max_dd = dd;
            max_dd_peak = Some((peak, peak_time));
        }
    }

    let Some((dd_peak, dd_peak_time)) = max_dd_peak else {
        return (0.0, 0);
    };

    let recovered_at = curve
        .iter()
        .filter(|p| p.timestamp >= dd_peak_time)
        .skip_while(|p| p.equity >= dd_peak)
        .find(|p| p.equity >= dd_peak)
        .map_or(last.timestamp, |p| p.timestamp);

    (max_dd, recovered_at.saturating_sub(dd_peak_time).max(0))
}

fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let mean = mean(returns);
    let sharpe = safe_div(mean, population_std_dev(returns));

    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let sortino = if downside.is_empty() {
        0.0
    } else {
        safe_div(mean, population_std_dev(&downside))
    };

    (sharpe, sortino)
}

fn mean(values: &[f64]) -> f64 {
    safe_div(values.iter().sum::<f64>(), values.len() as f64)
}

fn population_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = safe_div(
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>(),
        values.len() as f64,
    );
    variance.sqrt()
}

/// Longest consecutive runs of winners and losers; breakeven trades end both.
fn compute_streaks(ordered: &[&Trade]) -> (usize, usize) {
    let mut longest_win = 0usize;
    let mut longest_loss = 0usize;
    let mut win_run = 0usize;
    let mut loss_run = 0usize;

    for trade in ordered {
        if trade.profit_loss > 0.0 {
            win_run += 1;
            loss_run = 0;
        } else if trade.profit_loss < 0.0 {
            loss_run += 1;
            win_run = 0;
        } else {
            win_run = 0;
            loss_run = 0;
        }
        longest_win = longest_win.max(win_run);
        longest_loss = longest_loss.max(loss_run);
    }

    (longest_win, longest_loss)
}
