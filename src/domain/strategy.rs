//! Strategy definition: entry filter, exit ladder and sizing policy.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub entry: EntryConditions,
    pub exit: ExitConditions,
    pub sizing: PositionSizing,
}

/// Entry-time thresholds. Every `None` is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryConditions {
    pub min_risk_score: Option<f64>,
    pub max_risk_score: Option<f64>,
    pub min_liquidity: Option<f64>,
    pub max_liquidity: Option<f64>,
    pub min_holders: Option<u64>,
    pub max_holders: Option<u64>,
    pub min_top10_percent: Option<f64>,
    pub max_top10_percent: Option<f64>,
    pub require_mint_revoked: Option<bool>,
    pub require_freeze_revoked: Option<bool>,
    pub require_lp_locked: Option<bool>,
    pub require_socials: Option<bool>,
    pub require_twitter: Option<bool>,
    pub require_telegram: Option<bool>,
    pub require_website: Option<bool>,
    pub min_smart_money_buys: Option<u32>,
    pub min_token_age_minutes: Option<f64>,
    pub max_token_age_minutes: Option<f64>,
}

/// One rung of the take-profit ladder.
///
/// `sell_percent` is a share of the original position, capped at whatever is
/// still open when the rung fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    pub percent_gain: f64,
    pub sell_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitConditions {
    pub take_profit_levels: Vec<TakeProfitLevel>,
    /// Negative percentage, e.g. -20.0.
    pub stop_loss_percent: f64,
    pub trailing_stop_percent: Option<f64>,
    pub trailing_stop_activation_percent: Option<f64>,
    pub max_hold_time_hours: Option<f64>,
    pub exit_on_rug_signal: bool,
}

impl ExitConditions {
    /// Take-profit rungs ordered by ascending `percent_gain`.
    pub fn sorted_take_profits(&self) -> Vec<TakeProfitLevel> {
        let mut levels = self.take_profit_levels.clone();
        levels.sort_by(|a, b| a.percent_gain.total_cmp(&b.percent_gain));
        levels
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    Fixed,
    PercentOfCapital,
    RiskBased,
    /// Method name that did not match any known policy; kept for validation.
    Unrecognized(String),
}

impl SizingMethod {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixed" => SizingMethod::Fixed,
            "percent_of_capital" => SizingMethod::PercentOfCapital,
            "risk_based" => SizingMethod::RiskBased,
            _ => SizingMethod::Unrecognized(name.trim().to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, SizingMethod::Unrecognized(_))
    }
}

impl fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMethod::Fixed => f.write_str("fixed"),
            SizingMethod::PercentOfCapital => f.write_str("percent_of_capital"),
            SizingMethod::RiskBased => f.write_str("risk_based"),
            SizingMethod::Unrecognized(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizing {
    pub method: SizingMethod,
    pub fixed_amount: Option<f64>,
    pub percent_of_capital: Option<f64>,
    pub risk_percent: Option<f64>,
    pub max_position_size: Option<f64>,
    pub max_concurrent_positions: Option<usize>,
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing {
            method: SizingMethod::Fixed,
            fixed_amount: None,
            percent_of_capital: None,
            risk_percent: None,
            max_position_size: None,
            max_concurrent_positions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LadderError {
    #[error("empty rung in take-profit list")]
    EmptyRung,

    #[error("rung '{0}' must be written as GAIN:SELL")]
    MalformedRung(String),

    #[error("rung '{0}' contains a non-numeric value")]
    NonNumeric(String),
}

/// Parse a take-profit ladder written as `GAIN:SELL` pairs, e.g.
/// `"50:50, 100:100"`.
pub fn parse_take_profit_levels(input: &str) -> Result<Vec<TakeProfitLevel>, LadderError> {
    let mut levels = Vec::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(LadderError::EmptyRung);
        }
        let (gain, sell) = trimmed
            .split_once(':')
            .ok_or_else(|| LadderError::MalformedRung(trimmed.to_string()))?;
        let percent_gain: f64 = gain
            .trim()
            .parse()
            .map_err(|_| LadderError::NonNumeric(trimmed.to_string()))?;
        let sell_percent: f64 = sell
            .trim()
            .parse()
            .map_err(|_| LadderError::NonNumeric(trimmed.to_string()))?;
        levels.push(TakeProfitLevel {
            percent_gain,
            sell_percent,
        });
    }

    Ok(levels)
}
