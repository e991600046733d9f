//! Backtest pipeline: fetch records for a window, simulate, aggregate.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::error::TokensimError;
use crate::domain::lifecycle::LifecycleRecord;
use crate::domain::metrics::{self, PerformanceReport};
use crate::domain::position::Trade;
use crate::domain::simulator::simulate;
use crate::domain::strategy::StrategyDefinition;
use crate::ports::lifecycle_port::LifecyclePort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

impl BacktestConfig {
    /// Inclusive window in unix seconds: start of `start_date` through the
    /// last second of `end_date`, UTC.
    pub fn window(&self) -> (i64, i64) {
        let start = self
            .start_date
            .and_hms_opt(0, 0, 0)
            .map_or(0, |dt| dt.and_utc().timestamp());
        let end = self
            .end_date
            .and_hms_opt(23, 59, 59)
            .map_or(start, |dt| dt.and_utc().timestamp());
        (start, end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub report: PerformanceReport,
    pub records_considered: usize,
}

/// Fetch the window's records from `port` and run `strategy` over them.
pub fn run_backtest(
    port: &dyn LifecyclePort,
    strategy: &StrategyDefinition,
    config: &BacktestConfig,
) -> Result<BacktestResult, TokensimError> {
    let records = fetch_window(port, config)?;
    Ok(run_on_records(&records, strategy, config))
}

/// Load records and drop any the supplier returned outside the window.
pub fn fetch_window(
    port: &dyn LifecyclePort,
    config: &BacktestConfig,
) -> Result<Vec<LifecycleRecord>, TokensimError> {
    let (start, end) = config.window();
    let mut records = port.get_lifecycle_records(start, end)?;
    let fetched = records.len();
    records.retain(|r| r.discovered_at >= start && r.discovered_at <= end);
    if records.len() < fetched {
        warn!(
            dropped = fetched - records.len(),
            "supplier returned records outside the backtest window"
        );
    }
    info!(records = records.len(), start, end, "loaded lifecycle records");
    Ok(records)
}

/// Simulate and aggregate over already-loaded records.
pub fn run_on_records(
    records: &[LifecycleRecord],
    strategy: &StrategyDefinition,
    config: &BacktestConfig,
) -> BacktestResult {
    let (start, end) = config.window();
    let trades = simulate(records, strategy, config.initial_capital);
    let report = metrics::aggregate(
        &trades,
        config.initial_capital,
        &strategy.id,
        &strategy.name,
        start,
        end,
    );
    info!(
        strategy = %strategy.name,
        trades = report.total_trades,
        final_capital = report.final_capital,
        "backtest complete"
    );
    BacktestResult {
        trades,
        report,
        records_considered: records.len(),
    }
}

/// Run several strategies over the same records. Each run gets fresh
/// capital and an empty position book; results keep the input order.
pub fn compare_strategies(
    records: &[LifecycleRecord],
    strategies: &[StrategyDefinition],
    config: &BacktestConfig,
) -> Vec<BacktestResult> {
    strategies
        .iter()
        .map(|strategy| run_on_records(records, strategy, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::test_support::record;
    use crate::domain::strategy::test_support::single_rung_strategy;

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            initial_capital: 10_000.0,
        }
    }

    struct FixedPort(Vec<LifecycleRecord>);

    impl LifecyclePort for FixedPort {
        fn get_lifecycle_records(
            &self,
            _start: i64,
            _end: i64,
        ) -> Result<Vec<LifecycleRecord>, TokensimError> {
            Ok(self.0.clone())
        }

        fn get_data_range(&self) -> Result<Option<(i64, i64, usize)>, TokensimError> {
            Ok(None)
        }
    }

    #[test]
    fn window_covers_whole_days() {
        let (start, end) = sample_config().window();
        assert_eq!(start, 1_704_067_200);
        assert_eq!(end, 1_706_745_599);
    }

    #[test]
    fn records_outside_window_are_dropped() {
        let (start, end) = sample_config().window();
        let port = FixedPort(vec![
            record("EARLY", start - 1),
            record("IN", start + 60),
            record("LATE", end + 1),
        ]);
        let result = run_backtest(&port, &single_rung_strategy(), &sample_config()).unwrap();
        assert_eq!(result.records_considered, 1);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].token_mint, "IN");
    }

    #[test]
    fn report_identity_comes_from_strategy_and_window() {
        let config = sample_config();
        let (start, end) = config.window();
        let result = run_on_records(&[], &single_rung_strategy(), &config);
        assert_eq!(result.report.strategy_id, "s1");
        assert_eq!(result.report.strategy_name, "Double Up");
        assert_eq!(result.report.start_date, start);
        assert_eq!(result.report.end_date, end);
        assert_eq!(result.report.total_trades, 0);
    }

    #[test]
    fn compare_runs_are_independent() {
        let config = sample_config();
        let (start, _) = config.window();
        let records = vec![record("AAA", start + 10), record("BBB", start + 20)];
        let a = single_rung_strategy();
        let mut b = single_rung_strategy();
        b.id = "s2".into();
        b.sizing.fixed_amount = Some(2_000.0);

        let results = compare_strategies(&records, &[a.clone(), b], &config);
        assert_eq!(results.len(), 2);
        assert!((results[0].report.final_capital - 12_000.0).abs() < 1e-9);
        assert!((results[1].report.final_capital - 14_000.0).abs() < 1e-9);

        // rerunning the first strategy alone gives the same ledger
        let solo = run_on_records(&records, &a, &config);
        assert_eq!(solo.trades, results[0].trades);
    }
}
