//! Lifecycle record access port trait.

use crate::domain::error::TokensimError;
use crate::domain::lifecycle::LifecycleRecord;

pub trait LifecyclePort {
    /// Records for tokens discovered in `[start, end]` (unix seconds).
    /// Ordering is not guaranteed.
    fn get_lifecycle_records(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<LifecycleRecord>, TokensimError>;

    /// Earliest and latest discovery time plus record count, if any data exists.
    fn get_data_range(&self) -> Result<Option<(i64, i64, usize)>, TokensimError>;
}
