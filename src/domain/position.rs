//! Open positions, closing fills and the trade ledger entries they produce.

use crate::domain::lifecycle::LifecycleRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percent amounts below this are treated as fully closed.
pub const PERCENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Win,
    Loss,
    Breakeven,
    StoppedOut,
    TimeExit,
    RugExit,
}

impl ExitReason {
    /// Classify a plain exit by the sign of its return.
    pub fn from_return(return_ratio: f64) -> Self {
        if return_ratio > 0.0 {
            ExitReason::Win
        } else if return_ratio < 0.0 {
            ExitReason::Loss
        } else {
            ExitReason::Breakeven
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Win => "win",
            ExitReason::Loss => "loss",
            ExitReason::Breakeven => "breakeven",
            ExitReason::StoppedOut => "stopped_out",
            ExitReason::TimeExit => "time_exit",
            ExitReason::RugExit => "rug_exit",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry-time metrics captured when the position opened.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub risk_score: Option<f64>,
    pub liquidity: Option<f64>,
    pub holders: Option<u64>,
    pub top10_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub position_id: u64,
    pub token_mint: String,
    pub entry_price: f64,
    pub entry_time: i64,
    pub notional: f64,
    /// Share of the original notional still open, 0..=100.
    pub remaining_percent: f64,
    pub snapshot: EntrySnapshot,
}

/// A single closing order produced by the exit resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub percent: f64,
    pub price: f64,
    pub time: i64,
    pub reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub position_id: u64,
    pub token_mint: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: i64,
    pub exit_time: i64,
    pub percent_closed: f64,
    pub notional: f64,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
    pub hold_time_secs: i64,
    pub exit_reason: ExitReason,
}

impl OpenPosition {
    pub fn open(position_id: u64, record: &LifecycleRecord, notional: f64) -> Self {
        OpenPosition {
            position_id,
            token_mint: record.token_mint.clone(),
            entry_price: record.initial_price,
            entry_time: record.discovered_at,
            notional,
            remaining_percent: 100.0,
            snapshot: EntrySnapshot {
                risk_score: record.initial_risk_score,
                liquidity: record.initial_liquidity,
                holders: record.initial_holders,
                top10_percent: record.initial_top10_percent,
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.remaining_percent <= PERCENT_EPSILON
    }

    pub fn return_ratio(&self, price: f64) -> f64 {
        if self.entry_price > 0.0 {
            price / self.entry_price - 1.0
        } else {
            0.0
        }
    }

    /// Apply a fill, shrinking the open share and returning the ledger entry.
    pub fn close(&mut self, fill: &Fill) -> Trade {
        let percent = fill.percent.min(self.remaining_percent);
        let filled_notional = self.notional * percent / 100.0;
        let ratio = self.return_ratio(fill.price);

        self.remaining_percent -= percent;
        if self.remaining_percent <= PERCENT_EPSILON {
            self.remaining_percent = 0.0;
        }

        Trade {
            position_id: self.position_id,
            token_mint: self.token_mint.clone(),
            entry_price: self.entry_price,
            exit_price: fill.price,
            entry_time: self.entry_time,
            exit_time: fill.time,
            percent_closed: percent,
            notional: filled_notional,
            profit_loss: filled_notional * ratio,
            profit_loss_percent: ratio * 100.0,
            hold_time_secs: fill.time.saturating_sub(self.entry_time).max(0),
            exit_reason: fill.reason,
        }
    }
}
