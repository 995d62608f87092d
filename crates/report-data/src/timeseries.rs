//! Assembly of normalized records into a [`DailyTable`].

use tracing::debug;

use report_core::error::Result;
use report_core::models::{DailyTable, RawRecord};

use crate::normalizer::RecordNormalizer;

/// Builds the daily table from a raw record collection.
pub struct TimeSeriesBuilder;

impl TimeSeriesBuilder {
    /// Normalize every record, keeping input order.
    ///
    /// The first malformed record fails the whole build; no partial table is
    /// returned. Dates are neither sorted nor deduplicated.
    pub fn build(records: &[RawRecord]) -> Result<DailyTable> {
        let observations = records
            .iter()
            .enumerate()
            .map(|(i, record)| RecordNormalizer::normalize(i, record))
            .collect::<Result<Vec<_>>>()?;

        debug!("Built daily table with {} observations", observations.len());
        Ok(DailyTable::new(observations))
    }
}
