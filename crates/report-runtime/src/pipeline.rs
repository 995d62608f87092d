//! Record-to-table pipeline and report assembly.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use report_core::error::Result;
use report_core::models::{CumulativeTable, MonthlyTable, RawRecord};
use report_data::aggregator::MonthlyAggregator;
use report_data::chart::ChartSink;
use report_data::cumulative::CumulativeDeriver;
use report_data::export::CsvSink;
use report_data::report::HtmlSink;
use report_data::sink::{ReportContext, ReportSink};
use report_data::timeseries::TimeSeriesBuilder;

/// The two tables handed to the report consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTables {
    /// Number of daily observations that fed the tables.
    pub daily_count: usize,
    pub monthly: MonthlyTable,
    pub cumulative: CumulativeTable,
}

/// Runs normalization, aggregation and accumulation in order.
pub struct ReportPipeline;

impl ReportPipeline {
    /// Build both tables from raw records.
    ///
    /// Fails on the first malformed record; no partial tables are produced.
    pub fn run(records: &[RawRecord]) -> Result<ReportTables> {
        tracing::debug!(records = records.len(), "building daily time series");
        let daily = TimeSeriesBuilder::build(records)?;

        let monthly = MonthlyAggregator::aggregate(&daily);
        let cumulative = CumulativeDeriver::derive(&monthly);

        tracing::info!(
            days = daily.len(),
            months = monthly.len(),
            "aggregated records into monthly table"
        );

        Ok(ReportTables {
            daily_count: daily.len(),
            monthly,
            cumulative,
        })
    }
}

// ── ReportAssembler ───────────────────────────────────────────────────────────

/// Hands the tables to every registered sink.
pub struct ReportAssembler {
    sinks: Vec<Box<dyn ReportSink + Send + Sync>>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// CSV, chart and HTML sinks.
    pub fn with_default_sinks(sigma: f64) -> Self {
        Self::new()
            .with_sink(CsvSink)
            .with_sink(ChartSink::new(sigma))
            .with_sink(HtmlSink)
    }

    pub fn with_sink(mut self, sink: impl ReportSink + Send + Sync + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Write every sink's output for `department`, returning all files produced.
    ///
    /// Sinks run in registration order; the first failure aborts the rest.
    pub fn assemble(
        &self,
        department: &str,
        tables: &ReportTables,
        generated_on: NaiveDate,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let ctx = ReportContext {
            department,
            monthly: &tables.monthly,
            cumulative: &tables.cumulative,
            generated_on,
            output_dir,
        };

        let mut written = Vec::new();
        for sink in &self.sinks {
            let files = sink.write(&ctx)?;
            tracing::info!(sink = sink.name(), files = files.len(), "sink finished");
            written.extend(files);
        }
        Ok(written)
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::error::ReportError;
    use report_core::models::MonthKey;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn rec(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn scenario() -> Vec<RawRecord> {
        vec![
            rec(json!({"date": "2021-01-05", "day_hosp_new": 10, "day_death_new": 1})),
            rec(json!({"date": "2021-01-20", "day_hosp_new": 5})),
            rec(json!({"date": "2021-02-03", "day_death_new": 2})),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 12, 18).unwrap()
    }

    #[test]
    fn test_run_scenario() {
        let tables = ReportPipeline::run(&scenario()).unwrap();

        assert_eq!(tables.daily_count, 3);
        let monthly: Vec<_> = tables.monthly.iter().map(|r| (r.month, r.values())).collect();
        assert_eq!(
            monthly,
            vec![
                (MonthKey::new(2021, 1).unwrap(), [15, 0, 0, 1]),
                (MonthKey::new(2021, 2).unwrap(), [0, 0, 0, 2]),
            ]
        );
        let cumulative: Vec<_> = tables.cumulative.iter().map(|r| r.values()).collect();
        assert_eq!(cumulative, vec![[15, 0, 0, 1], [15, 0, 0, 3]]);
    }

    #[test]
    fn test_run_empty_input() {
        let tables = ReportPipeline::run(&[]).unwrap();
        assert_eq!(tables, ReportTables::default());
    }

    #[test]
    fn test_run_fails_on_malformed_record() {
        let mut records = scenario();
        records.push(rec(json!({"date": "2021-13-45"})));
        let err = ReportPipeline::run(&records).unwrap_err();
        assert!(matches!(err, ReportError::MalformedDate { index: 3, .. }));
    }

    struct CountingSink {
        calls: Arc<AtomicUsize>,
    }

    impl ReportSink for CountingSink {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn write(&self, ctx: &ReportContext<'_>) -> Result<Vec<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ctx.output_path(".count")])
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn write(&self, _ctx: &ReportContext<'_>) -> Result<Vec<PathBuf>> {
            Err(ReportError::Config("sink unavailable".to_string()))
        }
    }

    #[test]
    fn test_assemble_runs_sinks_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assembler = ReportAssembler::new()
            .with_sink(CountingSink { calls: Arc::clone(&calls) })
            .with_sink(CountingSink { calls: Arc::clone(&calls) });
        let tables = ReportPipeline::run(&scenario()).unwrap();

        let written = assembler
            .assemble("Paris", &tables, today(), Path::new("out"))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0], PathBuf::from("out/Paris.count"));
    }

    #[test]
    fn test_assemble_stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assembler = ReportAssembler::new()
            .with_sink(FailingSink)
            .with_sink(CountingSink { calls: Arc::clone(&calls) });
        let tables = ReportTables::default();

        let result = assembler.assemble("Paris", &tables, today(), Path::new("out"));

        assert!(matches!(result, Err(ReportError::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_sinks_write_full_report() {
        let tmp = TempDir::new().unwrap();
        let assembler = ReportAssembler::with_default_sinks(1.0);
        assert_eq!(assembler.sink_names(), vec!["csv", "charts", "html"]);

        let tables = ReportPipeline::run(&scenario()).unwrap();
        let written = assembler
            .assemble("Paris", &tables, today(), tmp.path())
            .unwrap();

        // 2 CSV files, 10 charts, 1 HTML page.
        assert_eq!(written.len(), 13);
        assert!(written.iter().all(|p| p.exists()));
        assert!(tmp.path().join("Paris_html_report.html").exists());
        assert!(tmp.path().join("Paris_cumulative.csv").exists());
    }
}
