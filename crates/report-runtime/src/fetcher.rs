//! Retrying wrapper around a [`RecordSource`].
//!
//! Transient retrieval failures are retried up to [`MAX_RETRY_ATTEMPTS`] times
//! with linear back-off. Answers that would not change on retry (a department
//! with no records, an undecodable body) are returned straight away.

use std::thread;
use std::time::Duration;

use report_core::error::Result;
use report_data::source::{RecordSource, SourcePayload};

/// Maximum number of fetch attempts before giving up.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default back-off step; attempt `n` waits `n * step`.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(100);

// ── RecordFetcher ─────────────────────────────────────────────────────────────

pub struct RecordFetcher<S> {
    source: S,
    backoff_step: Duration,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
}

impl<S: RecordSource> RecordFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            backoff_step: DEFAULT_BACKOFF_STEP,
            last_error: None,
        }
    }

    /// Override the back-off step (tests use zero).
    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Fetch records for `department`, retrying transient failures.
    ///
    /// Linear back-off: attempt 1 waits 0, attempt 2 one step, attempt 3 two steps.
    pub fn fetch(&mut self, department: &str) -> Result<SourcePayload> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let sleep = self.backoff_step * attempt;
                tracing::debug!(
                    attempt,
                    sleep_ms = sleep.as_millis() as u64,
                    "retrying fetch after back-off"
                );
                thread::sleep(sleep);
            }

            match self.source.fetch(department) {
                Ok(payload) => {
                    tracing::debug!(records = payload.records.len(), "fetch succeeded");
                    self.last_error = None;
                    return Ok(payload);
                }
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    attempt += 1;
                    if !e.is_transient() || attempt >= MAX_RETRY_ATTEMPTS {
                        return Err(e);
                    }
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                }
            }
        }
    }

    /// Human-readable description of the last fetch error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
