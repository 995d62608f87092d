//! Running totals across the monthly table.

use report_core::models::{CumulativeTable, Metric, MonthRow, MonthlyTable};

/// Derives the cumulative table from a monthly table.
pub struct CumulativeDeriver;

impl CumulativeDeriver {
    /// Prefix-sum each metric column, left to right.
    ///
    /// `monthly` must already be sorted ascending by month (as produced by
    /// [`crate::aggregator::MonthlyAggregator`]); rows are not re-sorted.
    pub fn derive(monthly: &MonthlyTable) -> CumulativeTable {
        let mut running = [0u64; 4];

        let rows = monthly
            .iter()
            .map(|row| {
                let mut out = MonthRow::zeroed(row.month);
                for metric in Metric::ALL {
                    let total = &mut running[metric.index()];
                    *total += row.value(metric);
                    *out.value_mut(metric) = *total;
                }
                out
            })
            .collect();

        CumulativeTable::from_sorted_rows(rows)
    }
}
