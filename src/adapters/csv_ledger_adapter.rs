//! CSV ledger writer.
//!
//! Writes one row per fill to `output_path` and the equity curve to a sibling
//! `<stem>_equity.csv`.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TokensimError;
use crate::domain::strategy::StrategyDefinition;
use crate::ports::report_port::{suffixed_path, ReportPort};

pub struct CsvLedgerAdapter;

impl CsvLedgerAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn equity_path(output_path: &str) -> String {
        suffixed_path(output_path, "equity")
    }
}

impl Default for CsvLedgerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_rows<T: Serialize>(path: &str, rows: &[T], header: &[&str]) -> Result<(), TokensimError> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!rows.is_empty())
        .from_path(path)
        .map_err(|e| TokensimError::Report {
            reason: format!("failed to open {path}: {e}"),
        })?;

    // serde only emits a header alongside the first row
    if rows.is_empty() {
        wtr.write_record(header).map_err(|e| TokensimError::Report {
            reason: e.to_string(),
        })?;
    }
    for row in rows {
        wtr.serialize(row).map_err(|e| TokensimError::Report {
            reason: format!("failed to write {path}: {e}"),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

const LEDGER_HEADER: &[&str] = &[
    "position_id",
    "token_mint",
    "entry_price",
    "exit_price",
    "entry_time",
    "exit_time",
    "percent_closed",
    "notional",
    "profit_loss",
    "profit_loss_percent",
    "hold_time_secs",
    "exit_reason",
];

const EQUITY_HEADER: &[&str] = &["timestamp", "equity", "drawdown_from_peak"];

impl ReportPort for CsvLedgerAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &StrategyDefinition,
        output_path: &str,
    ) -> Result<(), TokensimError> {
        write_rows(output_path, &result.trades, LEDGER_HEADER)?;
        let equity_path = Self::equity_path(output_path);
        write_rows(&equity_path, &result.report.equity_curve, EQUITY_HEADER)?;

        info!(
            strategy = %strategy.id,
            ledger = output_path,
            equity = %equity_path,
            rows = result.trades.len(),
            "wrote CSV ledger"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_on_records, BacktestConfig};
    use crate::domain::lifecycle::test_support::record;
    use crate::domain::position::Trade;
    use crate::domain::strategy::test_support::single_rung_strategy;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result(records: usize) -> BacktestResult {
        let config = BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            initial_capital: 10_000.0,
        };
        let (start, _) = config.window();
        let records: Vec<_> = (0..records)
            .map(|i| record(&format!("MINT{i}"), start + 60 * i as i64))
            .collect();
        run_on_records(&records, &single_rung_strategy(), &config)
    }

    #[test]
    fn writes_ledger_and_equity_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("ledger.csv");
        let out = out.to_str().unwrap();
        let result = sample_result(2);

        CsvLedgerAdapter::new()
            .write(&result, &single_rung_strategy(), out)
            .unwrap();

        let mut rdr = csv::Reader::from_path(out).unwrap();
        let trades: Vec<Trade> = rdr.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(trades, result.trades);

        let equity = fs::read_to_string(CsvLedgerAdapter::equity_path(out)).unwrap();
        let mut lines = equity.lines();
        assert_eq!(lines.next(), Some("timestamp,equity,drawdown_from_peak"));
        assert_eq!(lines.count(), result.report.equity_curve.len());
    }

    #[test]
    fn ledger_rows_use_snake_case_reasons() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("ledger.csv");
        let out = out.to_str().unwrap();

        CsvLedgerAdapter::new()
            .write(&sample_result(1), &single_rung_strategy(), out)
            .unwrap();
        let content = fs::read_to_string(out).unwrap();
        assert!(content.lines().nth(1).unwrap().ends_with(",win"));
    }

    #[test]
    fn empty_run_still_writes_headers() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("ledger.csv");
        let out = out.to_str().unwrap();

        CsvLedgerAdapter::new()
            .write(&sample_result(0), &single_rung_strategy(), out)
            .unwrap();
        let content = fs::read_to_string(out).unwrap();
        assert_eq!(content.trim_end(), LEDGER_HEADER.join(","));
    }

    #[test]
    fn equity_path_is_a_sibling() {
        assert_eq!(
            CsvLedgerAdapter::equity_path("out/run.csv"),
            "out/run_equity.csv"
        );
    }
}
