//! Exit resolution against a compressed lifecycle.
//!
//! With only entry, peak and final prices known, the resolver applies a fixed
//! evaluation order:
//! 1. Rug short-circuit: the whole remainder exits at the final price.
//! 2. Take-profit rungs in ascending gain order, each fired when the peak
//!    reached it. Every triggered rung is assumed fully realizable.
//! 3. One remainder exit: stop loss, trailing stop, max hold time, or the
//!    final price, in that priority.
//!
//! The returned fills always sum to the position's remaining percent.

use crate::domain::lifecycle::LifecycleRecord;
use crate::domain::position::{ExitReason, Fill, OpenPosition, PERCENT_EPSILON};
use crate::domain::strategy::ExitConditions;

const SECS_PER_HOUR: f64 = 3_600.0;

pub fn resolve_exits(
    position: &OpenPosition,
    record: &LifecycleRecord,
    exit: &ExitConditions,
) -> Vec<Fill> {
    let mut remaining = position.remaining_percent;
    let mut fills = Vec::new();

    if remaining <= PERCENT_EPSILON {
        return fills;
    }

    if exit.exit_on_rug_signal && record.is_rug() {
        fills.push(Fill {
            percent: remaining,
            price: record.usable_final_price(),
            time: record.rug_time(),
            reason: ExitReason::RugExit,
        });
        return fills;
    }

    let peak_multiplier = record.peak_multiplier();
    let peak_time = record.peak_time();

    for level in exit.sorted_take_profits() {
        if remaining <= PERCENT_EPSILON {
            break;
        }
        let rung_multiplier = 1.0 + level.percent_gain / 100.0;
        if peak_multiplier < rung_multiplier {
            continue;
        }
        let percent = level.sell_percent.min(remaining);
        if percent <= PERCENT_EPSILON {
            continue;
        }
        fills.push(Fill {
            percent,
            price: position.entry_price * rung_multiplier,
            time: peak_time,
            reason: ExitReason::Win,
        });
        remaining -= percent;
    }

    if remaining > PERCENT_EPSILON {
        fills.push(remainder_fill(position, record, exit, remaining));
    }

    fills
}

fn remainder_fill(
    position: &OpenPosition,
    record: &LifecycleRecord,
    exit: &ExitConditions,
    remaining: f64,
) -> Fill {
    let final_multiplier = record.final_multiplier();
    let stop_multiplier = 1.0 + exit.stop_loss_percent / 100.0;

    if final_multiplier <= stop_multiplier {
        return Fill {
            percent: remaining,
            price: position.entry_price * stop_multiplier,
            time: record.outcome_time(),
            reason: ExitReason::StoppedOut,
        };
    }

    if let Some(floor) =
        trailing_stop_floor(record, exit).filter(|&floor| record.final_price <= floor)
    {
        let reason = if final_multiplier > 1.0 {
            ExitReason::Win
        } else {
            ExitReason::Loss
        };
        return Fill {
            percent: remaining,
            price: floor,
            time: record.outcome_time(),
            reason,
        };
    }

    if let Some(hours) = exit.max_hold_time_hours {
        return Fill {
            percent: remaining,
            price: record.usable_final_price(),
            time: position
                .entry_time
                .saturating_add((hours * SECS_PER_HOUR).round() as i64),
            reason: ExitReason::TimeExit,
        };
    }

    let price = record.usable_final_price();
    Fill {
        percent: remaining,
        price,
        time: record.outcome_time(),
        reason: ExitReason::from_return(position.return_ratio(price)),
    }
}

/// Trailing floor below the peak, if a trailing stop is configured and the
/// peak cleared its activation level. Activation defaults to 0%.
fn trailing_stop_floor(record: &LifecycleRecord, exit: &ExitConditions) -> Option<f64> {
    let trail = exit.trailing_stop_percent?;
    let activation = exit.trailing_stop_activation_percent.unwrap_or(0.0);
    if record.peak_multiplier() >= 1.0 + activation / 100.0 {
        Some(record.peak_price * (1.0 - trail / 100.0))
    } else {
        None
    }
}
