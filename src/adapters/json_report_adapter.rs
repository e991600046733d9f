//! JSON report writer.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TokensimError;
use crate::domain::metrics::PerformanceReport;
use crate::domain::position::Trade;
use crate::domain::strategy::StrategyDefinition;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct ReportDocument<'a> {
    strategy: &'a StrategyDefinition,
    records_considered: usize,
    report: &'a PerformanceReport,
    trades: &'a [Trade],
}

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn render(
        &self,
        result: &BacktestResult,
        strategy: &StrategyDefinition,
    ) -> Result<String, TokensimError> {
        let doc = ReportDocument {
            strategy,
            records_considered: result.records_considered,
            report: &result.report,
            trades: &result.trades,
        };
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        };
        rendered.map_err(|e| TokensimError::Report {
            reason: format!("failed to serialize report: {e}"),
        })
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &StrategyDefinition,
        output_path: &str,
    ) -> Result<(), TokensimError> {
        let json = self.render(result, strategy)?;
        if let Some(parent) = Path::new(output_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;
        info!(strategy = %strategy.id, path = output_path, "wrote JSON report");
        Ok(())
    }
}
