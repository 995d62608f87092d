//! CSV export of the monthly and cumulative tables.

use std::fmt::Write as _;
use std::path::PathBuf;

use report_core::error::Result;
use report_core::models::{Metric, MonthRow};

use crate::sink::{ReportContext, ReportSink};
use crate::snapshot::write_atomic;

/// Header of the month column.
pub const DATE_COLUMN: &str = "Date";

/// Render rows as CSV: a `Date` column (`YYYY-MM`) then one column per metric.
///
/// Every cell is a month label or an integer, so no quoting is needed.
pub fn rows_to_csv(rows: &[MonthRow]) -> String {
    let mut out = String::new();

    out.push_str(DATE_COLUMN);
    for metric in Metric::ALL {
        out.push(',');
        out.push_str(metric.field_name());
    }
    out.push('\n');

    for row in rows {
        let _ = write!(out, "{}", row.month);
        for value in row.values() {
            let _ = write!(out, ",{}", value);
        }
        out.push('\n');
    }

    out
}

/// Writes `<dept>.csv` (monthly) and `<dept>_cumulative.csv`.
pub struct CsvSink;

impl ReportSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<Vec<PathBuf>> {
        let monthly_path = ctx.output_path(".csv");
        write_atomic(&monthly_path, rows_to_csv(ctx.monthly.rows()).as_bytes())?;

        let cumulative_path = ctx.output_path("_cumulative.csv");
        write_atomic(
            &cumulative_path,
            rows_to_csv(ctx.cumulative.rows()).as_bytes(),
        )?;

        Ok(vec![monthly_path, cumulative_path])
    }
}
