use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One raw record as supplied by the remote dataset (the API's `fields` object).
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

// ── Metric ────────────────────────────────────────────────────────────────────

/// The four hospital metrics tracked per day, in fixed output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// New hospital admissions.
    Hospitalized,
    /// New intensive-care admissions.
    IntensiveCare,
    /// Discharges (returns home).
    Discharged,
    /// Deaths.
    Deaths,
}

impl Metric {
    /// Every metric, in output column order.
    pub const ALL: [Metric; 4] = [
        Metric::Hospitalized,
        Metric::IntensiveCare,
        Metric::Discharged,
        Metric::Deaths,
    ];

    /// Field name in the raw dataset record; also used as CSV column header.
    pub fn field_name(self) -> &'static str {
        match self {
            Metric::Hospitalized => "day_hosp_new",
            Metric::IntensiveCare => "day_intcare_new",
            Metric::Discharged => "day_out_new",
            Metric::Deaths => "day_death_new",
        }
    }

    /// Short column header for terminal and HTML tables.
    pub fn header(self) -> &'static str {
        match self {
            Metric::Hospitalized => "Admissions",
            Metric::IntensiveCare => "Intensive care",
            Metric::Discharged => "Discharges",
            Metric::Deaths => "Deaths",
        }
    }

    /// Chart title.
    pub fn title(self) -> &'static str {
        match self {
            Metric::Hospitalized => "New admissions to the hospital",
            Metric::IntensiveCare => "New intensive care admissions",
            Metric::Discharged => "Amount of home returns",
            Metric::Deaths => "Amount of deaths",
        }
    }

    /// Series colour, as a CSS colour name.
    pub fn color(self) -> &'static str {
        match self {
            Metric::Hospitalized => "green",
            Metric::IntensiveCare => "blue",
            Metric::Discharged => "gray",
            Metric::Deaths => "red",
        }
    }

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(self) -> usize {
        match self {
            Metric::Hospitalized => 0,
            Metric::IntensiveCare => 1,
            Metric::Discharged => 2,
            Metric::Deaths => 3,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ── DailyObservation / DailyTable ─────────────────────────────────────────────

/// One day's four metric counts for the chosen department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub hospitalized: u32,
    pub intensive_care: u32,
    pub discharged: u32,
    pub deaths: u32,
}

impl DailyObservation {
    /// Build an observation from values laid out in [`Metric::ALL`] order.
    pub fn from_values(date: NaiveDate, values: [u32; 4]) -> Self {
        let [hospitalized, intensive_care, discharged, deaths] = values;
        Self {
            date,
            hospitalized,
            intensive_care,
            discharged,
            deaths,
        }
    }

    pub fn value(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Hospitalized => self.hospitalized,
            Metric::IntensiveCare => self.intensive_care,
            Metric::Discharged => self.discharged,
            Metric::Deaths => self.deaths,
        }
    }

    /// Calendar month this observation falls in.
    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Daily observations in input order (not necessarily chronological).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyTable(Vec<DailyObservation>);

impl DailyTable {
    pub fn new(observations: Vec<DailyObservation>) -> Self {
        Self(observations)
    }

    pub fn observations(&self) -> &[DailyObservation] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyObservation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a DailyTable {
    type Item = &'a DailyObservation;
    type IntoIter = std::slice::Iter<'a, DailyObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month, ordered by `(year, month)`.
///
/// Displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ── MonthRow ──────────────────────────────────────────────────────────────────

/// Per-month metric totals. Shared row shape of the monthly and cumulative tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRow {
    pub month: MonthKey,
    pub hospitalized: u64,
    pub intensive_care: u64,
    pub discharged: u64,
    pub deaths: u64,
}

/// A row of the [`MonthlyTable`].
pub type MonthlyRow = MonthRow;
/// A row of the [`CumulativeTable`].
pub type CumulativeRow = MonthRow;

impl MonthRow {
    /// A row for `month` with every metric at zero.
    pub fn zeroed(month: MonthKey) -> Self {
        Self {
            month,
            hospitalized: 0,
            intensive_care: 0,
            discharged: 0,
            deaths: 0,
        }
    }

    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Hospitalized => self.hospitalized,
            Metric::IntensiveCare => self.intensive_care,
            Metric::Discharged => self.discharged,
            Metric::Deaths => self.deaths,
        }
    }

    pub fn value_mut(&mut self, metric: Metric) -> &mut u64 {
        match metric {
            Metric::Hospitalized => &mut self.hospitalized,
            Metric::IntensiveCare => &mut self.intensive_care,
            Metric::Discharged => &mut self.discharged,
            Metric::Deaths => &mut self.deaths,
        }
    }

    /// Metric values in [`Metric::ALL`] order.
    pub fn values(&self) -> [u64; 4] {
        Metric::ALL.map(|m| self.value(m))
    }
}

/// Column-wise sums over a set of month rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnTotals {
    pub hospitalized: u64,
    pub intensive_care: u64,
    pub discharged: u64,
    pub deaths: u64,
}

impl ColumnTotals {
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Hospitalized => self.hospitalized,
            Metric::IntensiveCare => self.intensive_care,
            Metric::Discharged => self.discharged,
            Metric::Deaths => self.deaths,
        }
    }

    fn add_row(&mut self, row: &MonthRow) {
        self.hospitalized += row.hospitalized;
        self.intensive_care += row.intensive_care;
        self.discharged += row.discharged;
        self.deaths += row.deaths;
    }
}

// ── MonthlyTable / CumulativeTable ────────────────────────────────────────────

macro_rules! month_table {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name(Vec<MonthRow>);

        impl $name {
            /// Wrap rows as given.
            ///
            /// Callers pass rows sorted ascending by month with no duplicates.
            /// The order is not checked here; unsorted rows simply produce a
            /// meaningless running total downstream.
            pub fn from_sorted_rows(rows: Vec<MonthRow>) -> Self {
                Self(rows)
            }

            pub fn rows(&self) -> &[MonthRow] {
                &self.0
            }

            pub fn iter(&self) -> std::slice::Iter<'_, MonthRow> {
                self.0.iter()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn last(&self) -> Option<&MonthRow> {
                self.0.last()
            }

            /// Month labels in row order.
            pub fn months(&self) -> Vec<MonthKey> {
                self.0.iter().map(|r| r.month).collect()
            }

            /// One metric's values in row order.
            pub fn column(&self, metric: Metric) -> Vec<u64> {
                self.0.iter().map(|r| r.value(metric)).collect()
            }

            /// Sum of every column across all rows.
            pub fn column_totals(&self) -> ColumnTotals {
                let mut totals = ColumnTotals::default();
                for row in &self.0 {
                    totals.add_row(row);
                }
                totals
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a MonthRow;
            type IntoIter = std::slice::Iter<'a, MonthRow>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    };
}

month_table!(
    /// Per-month sums, sorted ascending by month, one row per month present in the input.
    MonthlyTable
);

month_table!(
    /// Running totals across months; same length and month order as its [`MonthlyTable`].
    CumulativeTable
);

// ── Tests ─────────────────────────────────────────────────────────────────────
