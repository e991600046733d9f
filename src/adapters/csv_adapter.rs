//! CSV lifecycle record adapter.
//!
//! One row per token, headers named after [`LifecycleRecord`] fields. Optional
//! columns may be left blank or omitted entirely.

use crate::domain::error::TokensimError;
use crate::domain::lifecycle::LifecycleRecord;
use crate::ports::lifecycle_port::LifecyclePort;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvLifecycleAdapter {
    path: PathBuf,
}

impl CsvLifecycleAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Vec<LifecycleRecord>, TokensimError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TokensimError::Database {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut records = Vec::new();
        for result in rdr.deserialize::<LifecycleRecord>() {
            let record = result.map_err(|e| TokensimError::DatabaseQuery {
                reason: format!("CSV parse error in {}: {}", self.path.display(), e),
            })?;
            records.push(record);
        }
        debug!(path = %self.path.display(), rows = records.len(), "parsed lifecycle CSV");
        Ok(records)
    }
}

impl LifecyclePort for CsvLifecycleAdapter {
    fn get_lifecycle_records(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<LifecycleRecord>, TokensimError> {
        let mut records = self.read_all()?;
        records.retain(|r| r.discovered_at >= start && r.discovered_at <= end);
        records.sort_by_key(|r| r.discovered_at);
        Ok(records)
    }

    fn get_data_range(&self) -> Result<Option<(i64, i64, usize)>, TokensimError> {
        let records = self.read_all()?;
        let first = records.iter().map(|r| r.discovered_at).min();
        let last = records.iter().map(|r| r.discovered_at).max();
        Ok(first.zip(last).map(|(a, b)| (a, b, records.len())))
    }
}
