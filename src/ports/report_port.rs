//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TokensimError;
use crate::domain::strategy::StrategyDefinition;

/// Port for persisting a finished run.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &StrategyDefinition,
        output_path: &str,
    ) -> Result<(), TokensimError>;

    /// Default implementation: writes each result next to `output_path`, with
    /// the strategy id inserted before the extension.
    fn write_many(
        &self,
        results: &[(BacktestResult, StrategyDefinition)],
        output_path: &str,
    ) -> Result<(), TokensimError> {
        for (result, strategy) in results {
            self.write(result, strategy, &suffixed_path(output_path, &strategy.id))?;
        }
        Ok(())
    }
}

/// `out/report.json` + `fast` -> `out/report_fast.json`.
pub fn suffixed_path(output_path: &str, suffix: &str) -> String {
    let path = Path::new(output_path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    path.with_file_name(file_name).to_string_lossy().into_owned()
}
