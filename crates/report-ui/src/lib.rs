//! Terminal UI layer for the COVID report.
//!
//! Provides themes, the month table view and the application event loop
//! built on top of [`ratatui`] for browsing the monthly and cumulative
//! tables in the terminal.

pub mod app;
pub mod table_view;
pub mod themes;

pub use report_core as core;
