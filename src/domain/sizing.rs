//! Position sizing.

use crate::domain::strategy::{PositionSizing, SizingMethod};

pub const DEFAULT_FIXED_AMOUNT: f64 = 100.0;
pub const DEFAULT_PERCENT_OF_CAPITAL: f64 = 5.0;
pub const DEFAULT_RISK_PERCENT: f64 = 2.0;

/// Notional to commit to a new position, or 0 to skip the entry.
///
/// `RiskBased` is a straight percentage of capital; it does not look at the
/// stop-loss distance.
pub fn size(sizing: &PositionSizing, current_capital: f64, open_position_count: usize) -> f64 {
    if sizing
        .max_concurrent_positions
        .is_some_and(|max| open_position_count >= max)
    {
        return 0.0;
    }

    if !current_capital.is_finite() || current_capital <= 0.0 {
        return 0.0;
    }

    let raw = match &sizing.method {
        SizingMethod::Fixed => sizing.fixed_amount.unwrap_or(DEFAULT_FIXED_AMOUNT),
        SizingMethod::PercentOfCapital => {
            current_capital * sizing.percent_of_capital.unwrap_or(DEFAULT_PERCENT_OF_CAPITAL)
                / 100.0
        }
        SizingMethod::RiskBased => {
            current_capital * sizing.risk_percent.unwrap_or(DEFAULT_RISK_PERCENT) / 100.0
        }
        SizingMethod::Unrecognized(_) => 0.0,
    };

    if !raw.is_finite() {
        return 0.0;
    }

    let ceiling = sizing
        .max_position_size
        .map_or(current_capital, |cap| cap.min(current_capital));

    raw.clamp(0.0, ceiling.max(0.0))
}
