//! Data layer of the COVID report.
//!
//! Retrieves raw dataset records, normalizes them into a daily table,
//! aggregates by calendar month, derives running totals, and writes the
//! resulting tables out as CSV, SVG charts and an HTML report.

pub mod aggregator;
pub mod chart;
pub mod cumulative;
pub mod export;
pub mod normalizer;
pub mod report;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod timeseries;

pub use report_core as core;
