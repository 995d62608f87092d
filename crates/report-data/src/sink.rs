//! Output sinks for the aggregated tables.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use report_core::error::Result;
use report_core::formatting::sanitize_file_stem;
use report_core::models::{CumulativeTable, MonthlyTable};

/// Everything a sink needs to render one department's report.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    /// Department name as entered by the user.
    pub department: &'a str,
    pub monthly: &'a MonthlyTable,
    pub cumulative: &'a CumulativeTable,
    /// Date printed in the report greeting.
    pub generated_on: NaiveDate,
    /// Directory all files are written into.
    pub output_dir: &'a Path,
}

impl ReportContext<'_> {
    /// File-system safe version of the department name.
    pub fn file_stem(&self) -> String {
        sanitize_file_stem(self.department)
    }

    /// `<output_dir>/<stem><suffix>`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.file_stem(), suffix))
    }
}

/// A consumer of the monthly and cumulative tables.
pub trait ReportSink {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Write this sink's output, returning the files produced.
    fn write(&self, ctx: &ReportContext<'_>) -> Result<Vec<PathBuf>>;
}
