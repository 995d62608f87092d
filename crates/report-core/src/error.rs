use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the COVID report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A record's `date` field is missing or cannot be parsed to a calendar date.
    #[error("Malformed date in record {index}: {value}")]
    MalformedDate { index: usize, value: String },

    /// A present metric field holds something other than a non-negative integer.
    #[error("Malformed value for {field} in record {index}: {value}")]
    MalformedMetric {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// The remote dataset could not be retrieved.
    #[error("Failed to fetch records: {0}")]
    Fetch(String),

    /// The dataset returned zero hits for the requested department.
    #[error("No records found for department: {0}")]
    DepartmentNotFound(String),

    /// The dataset holds more matching records than were returned.
    #[error(
        "Only {received} of {available} records returned for {department}; \
         raise --rows or pass --allow-partial"
    )]
    IncompleteRecords {
        department: String,
        received: usize,
        available: u64,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// An output file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// Whether retrying the same request could succeed.
    ///
    /// Only retrieval failures are transient; malformed input and a department
    /// with no hits will fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReportError::Fetch(_))
    }
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
