//! Conversion of one raw dataset record into a [`DailyObservation`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use report_core::error::{ReportError, Result};
use report_core::models::{DailyObservation, Metric, RawRecord};

/// Name of the date field in raw records.
pub const DATE_FIELD: &str = "date";

/// Value substituted for an absent metric field.
pub const ABSENT_METRIC_DEFAULT: u32 = 0;

/// Plain calendar date layout.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Offset-less date-time layouts; RFC 3339 values are handled separately.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

// ── RecordNormalizer ──────────────────────────────────────────────────────────

/// Maps a raw record onto the fixed daily observation shape.
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Normalize `record`, the `index`-th record of its input.
    ///
    /// The date is mandatory. Each metric in [`Metric::ALL`] is read from its
    /// field name; an absent (or `null`) field becomes
    /// [`ABSENT_METRIC_DEFAULT`], a present one must be a non-negative integer.
    pub fn normalize(index: usize, record: &RawRecord) -> Result<DailyObservation> {
        let date = Self::parse_date(index, record.get(DATE_FIELD))?;

        let mut values = [ABSENT_METRIC_DEFAULT; 4];
        for metric in Metric::ALL {
            values[metric.index()] =
                Self::parse_metric(index, metric, record.get(metric.field_name()))?;
        }

        Ok(DailyObservation::from_values(date, values))
    }

    fn parse_date(index: usize, value: Option<&Value>) -> Result<NaiveDate> {
        let malformed = |v: Option<&Value>| ReportError::MalformedDate {
            index,
            value: v.map_or_else(|| "<missing>".to_string(), Value::to_string),
        };

        let Some(Value::String(s)) = value else {
            return Err(malformed(value));
        };

        parse_date_str(s).ok_or_else(|| malformed(value))
    }

    fn parse_metric(index: usize, metric: Metric, value: Option<&Value>) -> Result<u32> {
        let n = match value {
            None | Some(Value::Null) => return Ok(ABSENT_METRIC_DEFAULT),
            Some(Value::Number(n)) => n,
            Some(other) => return Err(malformed_metric(index, metric, other)),
        };

        let as_integer = n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .filter(|f| *f <= u32::MAX as f64)
                .map(|f| f as u64)
        });

        as_integer
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| malformed_metric(index, metric, value.unwrap_or(&Value::Null)))
    }
}

fn malformed_metric(index: usize, metric: Metric, value: &Value) -> ReportError {
    ReportError::MalformedMetric {
        index,
        field: metric.field_name(),
        value: value.to_string(),
    }
}

/// Parse a calendar date from `YYYY-MM-DD`, or the date part of an ISO
/// date-time (`2021-01-05T08:30:00`, `2021-01-05T00:00:00+00:00`).
///
/// The whole value must match; trailing text after a date is rejected.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
