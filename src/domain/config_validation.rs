//! Configuration and strategy validation.
//!
//! [`validate_backtest_config`] checks the `[backtest]` section before a run.
//! [`validate_strategy`] checks a built [`StrategyDefinition`] and reports every
//! violation as a display string; the simulator never repeats these checks.

use crate::domain::error::TokensimError;
use crate::domain::strategy::StrategyDefinition;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TokensimError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_data_source(config)?;
    Ok(())
}

/// Structural checks on a strategy. An empty list means valid.
pub fn validate_strategy(strategy: &StrategyDefinition) -> Vec<String> {
    let mut violations = Vec::new();

    if strategy.name.trim().is_empty() {
        violations.push("strategy name is required".to_string());
    }

    let exit = &strategy.exit;
    if exit.take_profit_levels.is_empty() {
        violations.push("at least one take-profit level is required".to_string());
    }
    if !(exit.stop_loss_percent < 0.0) {
        violations.push(format!(
            "stop loss must be negative, got {}",
            exit.stop_loss_percent
        ));
    }
    for (i, level) in exit.take_profit_levels.iter().enumerate() {
        if !(level.percent_gain > 0.0) {
            violations.push(format!(
                "take-profit level {} gain must be positive, got {}",
                i + 1,
                level.percent_gain
            ));
        }
        if !(level.sell_percent > 0.0 && level.sell_percent <= 100.0) {
            violations.push(format!(
                "take-profit level {} sell percent must be in (0, 100], got {}",
                i + 1,
                level.sell_percent
            ));
        }
    }
    if let Some(trail) = exit
        .trailing_stop_percent
        .filter(|&t| !(t > 0.0 && t < 100.0))
    {
        violations.push(format!("trailing stop must be in (0, 100), got {trail}"));
    }
    if let Some(activation) = exit
        .trailing_stop_activation_percent
        .filter(|&a| !(a >= 0.0))
    {
        violations.push(format!(
            "trailing stop activation must be non-negative, got {activation}"
        ));
    }
    if let Some(hours) = exit.max_hold_time_hours.filter(|&h| !(h > 0.0)) {
        violations.push(format!("max hold time must be positive, got {hours}"));
    }

    let sizing = &strategy.sizing;
    if !sizing.method.is_recognized() {
        violations.push(format!("unknown sizing method '{}'", sizing.method));
    }
    for (label, value) in [
        ("fixed amount", sizing.fixed_amount),
        ("percent of capital", sizing.percent_of_capital),
        ("risk percent", sizing.risk_percent),
        ("max position size", sizing.max_position_size),
    ] {
        if let Some(v) = value.filter(|&v| !(v > 0.0)) {
            violations.push(format!("{label} must be positive, got {v}"));
        }
    }

    violations
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TokensimError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(TokensimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TokensimError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(TokensimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TokensimError> {
    match value {
        None => Err(TokensimError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TokensimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), TokensimError> {
    let records = config.get_string("backtest", "records");
    let sqlite = config.get_string("sqlite", "path");

    match (records, sqlite) {
        (Some(r), _) if !r.trim().is_empty() => Ok(()),
        (_, Some(p)) if !p.trim().is_empty() => Ok(()),
        _ => Err(TokensimError::ConfigMissing {
            section: "backtest".to_string(),
            key: "records".to_string(),
        }),
    }
}
