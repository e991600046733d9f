//! Entry filter evaluation.
//!
//! Only entry-time fields of a [`LifecycleRecord`] are read here. Peak and
//! final state belong to the future of the trade and must never influence
//! whether it is taken.

use crate::domain::lifecycle::LifecycleRecord;
use crate::domain::strategy::EntryConditions;

/// True when the record satisfies every populated constraint.
///
/// A set constraint whose record field is missing fails.
pub fn passes(record: &LifecycleRecord, entry: &EntryConditions) -> bool {
    at_least(record.initial_risk_score, entry.min_risk_score)
        && at_most(record.initial_risk_score, entry.max_risk_score)
        && at_least(record.initial_liquidity, entry.min_liquidity)
        && at_most(record.initial_liquidity, entry.max_liquidity)
        && at_least(record.initial_holders, entry.min_holders)
        && at_most(record.initial_holders, entry.max_holders)
        && at_least(record.initial_top10_percent, entry.min_top10_percent)
        && at_most(record.initial_top10_percent, entry.max_top10_percent)
        && required(record.mint_revoked, entry.require_mint_revoked)
        && required(record.freeze_revoked, entry.require_freeze_revoked)
        && required(record.lp_locked, entry.require_lp_locked)
        && required(Some(record.has_any_social()), entry.require_socials)
        && required(record.has_twitter, entry.require_twitter)
        && required(record.has_telegram, entry.require_telegram)
        && required(record.has_website, entry.require_website)
        && at_least(record.smart_money_buys, entry.min_smart_money_buys)
        && at_least(record.token_age_minutes, entry.min_token_age_minutes)
        && at_most(record.token_age_minutes, entry.max_token_age_minutes)
}

fn at_least<T: PartialOrd>(value: Option<T>, bound: Option<T>) -> bool {
    match bound {
        None => true,
        Some(bound) => value.is_some_and(|v| v >= bound),
    }
}

fn at_most<T: PartialOrd>(value: Option<T>, bound: Option<T>) -> bool {
    match bound {
        None => true,
        Some(bound) => value.is_some_and(|v| v <= bound),
    }
}

// A flag set to false imposes nothing.
fn required(value: Option<bool>, flag: Option<bool>) -> bool {
    match flag {
        Some(true) => value == Some(true),
        _ => true,
    }
}
