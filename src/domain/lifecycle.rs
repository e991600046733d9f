//! Summarized token lifecycle records.
//!
//! A record compresses a token's history into its state at discovery, at its
//! price peak and at the end of the observation window. The simulator never
//! sees a tick stream; every exit decision is derived from these three points.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Seconds added to `discovered_at` when a record carries no peak timing.
pub const PEAK_FALLBACK_SECS: i64 = 3_600;
/// Seconds added to `discovered_at` when a rug record has no outcome time.
pub const RUG_FALLBACK_SECS: i64 = 3_600;
/// Seconds added to `discovered_at` when a record has no outcome time.
pub const OUTCOME_FALLBACK_SECS: i64 = 86_400;

/// Coarse label attached to a lifecycle once it was observed to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Rug,
    Pump,
    Moon,
    Stable,
    Decline,
    Unknown,
}

impl Outcome {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "rug" => Outcome::Rug,
            "pump" => Outcome::Pump,
            "moon" => Outcome::Moon,
            "stable" => Outcome::Stable,
            "decline" => Outcome::Decline,
            _ => Outcome::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Rug => "rug",
            Outcome::Pump => "pump",
            Outcome::Moon => "moon",
            Outcome::Stable => "stable",
            Outcome::Decline => "decline",
            Outcome::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Outcome::parse(&label))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One token's summarized lifecycle inside a backtest window.
///
/// Timestamps are unix seconds. Optional fields are genuinely optional in the
/// upstream store; fallbacks are applied where the field is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    pub token_mint: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub discovered_at: i64,

    pub initial_price: f64,
    #[serde(default)]
    pub initial_liquidity: Option<f64>,
    #[serde(default)]
    pub initial_risk_score: Option<f64>,
    #[serde(default)]
    pub initial_holders: Option<u64>,
    #[serde(default)]
    pub initial_top10_percent: Option<f64>,
    #[serde(default)]
    pub token_age_minutes: Option<f64>,

    pub peak_price: f64,
    #[serde(default)]
    pub peak_at: Option<i64>,
    #[serde(default)]
    pub time_to_peak_secs: Option<i64>,

    pub final_price: f64,
    #[serde(default)]
    pub final_liquidity: Option<f64>,

    pub outcome: Outcome,
    #[serde(default)]
    pub outcome_recorded_at: Option<i64>,

    #[serde(default)]
    pub mint_revoked: Option<bool>,
    #[serde(default)]
    pub freeze_revoked: Option<bool>,
    #[serde(default)]
    pub lp_locked: Option<bool>,

    #[serde(default)]
    pub has_twitter: Option<bool>,
    #[serde(default)]
    pub has_telegram: Option<bool>,
    #[serde(default)]
    pub has_website: Option<bool>,

    #[serde(default)]
    pub smart_money_buys: Option<u32>,
}

impl LifecycleRecord {
    /// A record can only be traded when its entry price is a positive number.
    pub fn has_valid_entry_price(&self) -> bool {
        self.initial_price.is_finite() && self.initial_price > 0.0
    }

    /// peak / initial, or 0 when the entry price is unusable.
    pub fn peak_multiplier(&self) -> f64 {
        ratio(self.peak_price, self.initial_price)
    }

    /// final / initial, or 0 when the entry price is unusable.
    pub fn final_multiplier(&self) -> f64 {
        ratio(self.final_price, self.initial_price)
    }

    /// Final price to book a fill at. Non-finite or negative prices count as 0.
    pub fn usable_final_price(&self) -> f64 {
        if self.final_price.is_finite() && self.final_price > 0.0 {
            self.final_price
        } else {
            0.0
        }
    }

    pub fn is_rug(&self) -> bool {
        self.outcome == Outcome::Rug
    }

    /// When the peak was reached: `peak_at`, else discovery plus time-to-peak,
    /// else one hour after discovery.
    pub fn peak_time(&self) -> i64 {
        self.peak_at
            .or_else(|| {
                self.time_to_peak_secs
                    .map(|t| self.discovered_at.saturating_add(t))
            })
            .unwrap_or(self.discovered_at.saturating_add(PEAK_FALLBACK_SECS))
    }

    pub fn rug_time(&self) -> i64 {
        self.outcome_recorded_at
            .unwrap_or(self.discovered_at.saturating_add(RUG_FALLBACK_SECS))
    }

    pub fn outcome_time(&self) -> i64 {
        self.outcome_recorded_at
            .unwrap_or(self.discovered_at.saturating_add(OUTCOME_FALLBACK_SECS))
    }

    pub fn has_any_social(&self) -> bool {
        self.has_twitter == Some(true)
            || self.has_telegram == Some(true)
            || self.has_website == Some(true)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_finite() && denominator > 0.0 && numerator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn multipliers_relative_to_initial_price() {
        let mut r = record("MINT", 1_000);
        r.initial_price = 2.0;
        r.peak_price = 5.0;
        r.final_price = 1.0;
        assert!((r.peak_multiplier() - 2.5).abs() < f64::EPSILON);
        assert!((r.final_multiplier() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn multipliers_zero_for_unusable_entry_price() {
        let mut r = record("MINT", 1_000);
        r.initial_price = 0.0;
        assert_eq!(r.peak_multiplier(), 0.0);
        assert_eq!(r.final_multiplier(), 0.0);
        assert!(!r.has_valid_entry_price());

        r.initial_price = f64::NAN;
        assert_eq!(r.peak_multiplier(), 0.0);
        assert!(!r.has_valid_entry_price());
    }

    #[test]
    fn peak_time_prefers_explicit_timestamp() {
        let mut r = record("MINT", 1_000);
        r.peak_at = Some(5_000);
        r.time_to_peak_secs = Some(60);
        assert_eq!(r.peak_time(), 5_000);
    }

    #[test]
    fn peak_time_falls_back_to_time_to_peak_then_one_hour() {
        let mut r = record("MINT", 1_000);
        r.time_to_peak_secs = Some(120);
        assert_eq!(r.peak_time(), 1_120);

        r.time_to_peak_secs = None;
        assert_eq!(r.peak_time(), 1_000 + PEAK_FALLBACK_SECS);
    }

    #[test]
    fn outcome_and_rug_time_fallbacks() {
        let mut r = record("MINT", 1_000);
        assert_eq!(r.rug_time(), 4_600);
        assert_eq!(r.outcome_time(), 87_400);

        r.outcome_recorded_at = Some(9_999);
        assert_eq!(r.rug_time(), 9_999);
        assert_eq!(r.outcome_time(), 9_999);
    }

    #[test]
    fn outcome_parse_is_case_insensitive_and_total() {
        assert_eq!(Outcome::parse("RUG"), Outcome::Rug);
        assert_eq!(Outcome::parse(" moon "), Outcome::Moon);
        assert_eq!(Outcome::parse("sideways"), Outcome::Unknown);
        assert_eq!(Outcome::Decline.to_string(), "decline");
    }

    #[test]
    fn extreme_timing_saturates_instead_of_overflowing() {
        let mut r = record("MINT", i64::MAX - 10);
        r.time_to_peak_secs = Some(i64::MAX);
        assert_eq!(r.peak_time(), i64::MAX);

        r.time_to_peak_secs = None;
        assert_eq!(r.peak_time(), i64::MAX);
        assert_eq!(r.rug_time(), i64::MAX);
        assert_eq!(r.outcome_time(), i64::MAX);
    }

    #[test]
    fn usable_final_price_zeroes_malformed_values() {
        let mut r = record("MINT", 0);
        assert_eq!(r.usable_final_price(), 1.5);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -2.0] {
            r.final_price = bad;
            assert_eq!(r.usable_final_price(), 0.0);
        }
    }

    #[test]
    fn outcome_deserializes_any_case() {
        let parsed: Vec<Outcome> =
            serde_json::from_str(r#"["Rug", "RUG", "pump", "Sideways"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Outcome::Rug, Outcome::Rug, Outcome::Pump, Outcome::Unknown]
        );
    }

    #[test]
    fn any_social_requires_an_explicit_true() {
        let mut r = record("MINT", 0);
        assert!(!r.has_any_social());
        r.has_telegram = Some(false);
        assert!(!r.has_any_social());
        r.has_website = Some(true);
        assert!(r.has_any_social());
    }
}
