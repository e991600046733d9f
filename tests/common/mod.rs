#![allow(dead_code)]

use chrono::NaiveDate;
use tokensim::domain::backtest::BacktestConfig;
use tokensim::domain::error::TokensimError;
pub use tokensim::domain::lifecycle::{LifecycleRecord, Outcome};
use tokensim::domain::strategy::{
    EntryConditions, ExitConditions, PositionSizing, SizingMethod, StrategyDefinition,
    TakeProfitLevel,
};
use tokensim::ports::lifecycle_port::LifecyclePort;

/// 2024-01-01T00:00:00Z
pub const JAN_1_2024: i64 = 1_704_067_200;

pub struct MockLifecyclePort {
    pub records: Vec<LifecycleRecord>,
    pub error: Option<String>,
}

impl MockLifecyclePort {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            error: None,
        }
    }

    pub fn with_records(mut self, records: Vec<LifecycleRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl LifecyclePort for MockLifecyclePort {
    fn get_lifecycle_records(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<LifecycleRecord>, TokensimError> {
        if let Some(reason) = &self.error {
            return Err(TokensimError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.discovered_at >= start && r.discovered_at <= end)
            .cloned()
            .collect())
    }

    fn get_data_range(&self) -> Result<Option<(i64, i64, usize)>, TokensimError> {
        let first = self.records.iter().map(|r| r.discovered_at).min();
        let last = self.records.iter().map(|r| r.discovered_at).max();
        Ok(first.zip(last).map(|(a, b)| (a, b, self.records.len())))
    }
}

/// Record with entry price 1.0 and the given peak/final multipliers.
pub fn lifecycle(mint: &str, discovered_at: i64, peak: f64, final_: f64) -> LifecycleRecord {
    LifecycleRecord {
        token_mint: mint.to_string(),
        symbol: None,
        discovered_at,
        initial_price: 1.0,
        initial_liquidity: None,
        initial_risk_score: None,
        initial_holders: None,
        initial_top10_percent: None,
        token_age_minutes: None,
        peak_price: peak,
        peak_at: None,
        time_to_peak_secs: None,
        final_price: final_,
        final_liquidity: None,
        outcome: Outcome::Pump,
        outcome_recorded_at: None,
        mint_revoked: None,
        freeze_revoked: None,
        lp_locked: None,
        has_twitter: None,
        has_telegram: None,
        has_website: None,
        smart_money_buys: None,
    }
}

pub fn ladder(levels: &[(f64, f64)]) -> Vec<TakeProfitLevel> {
    levels
        .iter()
        .map(|&(percent_gain, sell_percent)| TakeProfitLevel {
            percent_gain,
            sell_percent,
        })
        .collect()
}

/// Fixed $1000 sizing, the given ladder and stop loss, everything else unset.
pub fn strategy(levels: &[(f64, f64)], stop_loss: f64) -> StrategyDefinition {
    StrategyDefinition {
        id: "test".to_string(),
        name: "Test Strategy".to_string(),
        description: String::new(),
        entry: EntryConditions::default(),
        exit: ExitConditions {
            take_profit_levels: ladder(levels),
            stop_loss_percent: stop_loss,
            trailing_stop_percent: None,
            trailing_stop_activation_percent: None,
            max_hold_time_hours: None,
            exit_on_rug_signal: false,
        },
        sizing: PositionSizing {
            method: SizingMethod::Fixed,
            fixed_amount: Some(1_000.0),
            ..PositionSizing::default()
        },
    }
}

pub fn january_2024(initial_capital: f64) -> BacktestConfig {
    BacktestConfig {
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        initial_capital,
    }
}
