//! Runtime layer for the COVID report.
//!
//! Wraps record retrieval with retries, runs the record-to-table pipeline,
//! and hands the resulting tables to the report sinks.
//!
//! # Example
//! ```no_run
//! use report_runtime::fetcher::RecordFetcher;
//! use report_runtime::pipeline::{ReportAssembler, ReportPipeline};
//! use report_data::source::HttpRecordSource;
//!
//! # fn main() -> report_core::error::Result<()> {
//! let mut fetcher = RecordFetcher::new(HttpRecordSource::new(10_000)?);
//! let payload = fetcher.fetch("Paris")?;
//! let tables = ReportPipeline::run(&payload.raw_records())?;
//! let today = chrono::Local::now().date_naive();
//! ReportAssembler::with_default_sinks(1.0)
//!     .assemble("Paris", &tables, today, std::path::Path::new("data"))?;
//! # Ok(())
//! # }
//! ```

pub mod fetcher;
pub mod pipeline;

pub use report_core as core;
pub use report_data as data;
