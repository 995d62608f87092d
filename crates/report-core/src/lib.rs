//! Shared data model, error taxonomy, settings and formatting helpers for the
//! COVID report workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
