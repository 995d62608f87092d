//! Calendar-month aggregation of daily observations.

use std::collections::BTreeMap;

use report_core::models::{DailyObservation, DailyTable, Metric, MonthKey, MonthRow, MonthlyTable};

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups daily observations by calendar month.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Sum every metric per `(year, month)`.
    ///
    /// Returns one row per month present in the input, sorted ascending.
    /// Months with no observations are not filled in.
    pub fn aggregate(daily: &DailyTable) -> MonthlyTable {
        // BTreeMap keeps the keys sorted, so input order never matters.
        let mut map: BTreeMap<MonthKey, MonthRow> = BTreeMap::new();

        for obs in daily {
            let key = obs.month_key();
            map.entry(key)
                .or_insert_with(|| MonthRow::zeroed(key))
                .add_observation(obs);
        }

        tracing::debug!(
            "Aggregated {} observations into {} months",
            daily.len(),
            map.len()
        );

        MonthlyTable::from_sorted_rows(map.into_values().collect())
    }
}

/// Accumulation of a daily observation into a month bucket.
trait AddObservation {
    fn add_observation(&mut self, obs: &DailyObservation);
}

impl AddObservation for MonthRow {
    fn add_observation(&mut self, obs: &DailyObservation) {
        for metric in Metric::ALL {
            *self.value_mut(metric) += u64::from(obs.value(metric));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
