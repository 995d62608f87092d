//! Retrieval of raw records from the OpenDataSoft hospital dataset.
//!
//! [`RecordSource`] is the seam between the pipeline and wherever records come
//! from: [`HttpRecordSource`] queries the public API, [`StaticRecordSource`]
//! serves a payload already in memory (a saved snapshot, or test fixtures).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use report_core::error::{ReportError, Result};
use report_core::models::RawRecord;

/// Public OpenDataSoft search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://data.opendatasoft.com/api/records/1.0/search/";

/// Dataset holding the per-department hospital figures.
pub const DATASET: &str = "donnees-hospitalieres-covid-19-dep-france@public";

/// Per-request timeout for the HTTP source.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ── Payload ───────────────────────────────────────────────────────────────────

/// One API record. Only `fields` is consumed; the rest is kept for snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRecord {
    pub fields: RawRecord,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decoded search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    /// Total number of matching records on the server.
    #[serde(default)]
    pub nhits: u64,
    #[serde(default)]
    pub records: Vec<ApiRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SourcePayload {
    /// Build a payload straight from record field maps.
    pub fn from_fields(records: Vec<RawRecord>) -> Self {
        Self {
            nhits: records.len() as u64,
            records: records
                .into_iter()
                .map(|fields| ApiRecord {
                    fields,
                    extra: serde_json::Map::new(),
                })
                .collect(),
            extra: serde_json::Map::new(),
        }
    }

    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Whether the server holds more matching records than were returned.
    pub fn is_truncated(&self) -> bool {
        (self.records.len() as u64) < self.nhits
    }

    /// The raw records the pipeline consumes, in response order.
    pub fn raw_records(&self) -> Vec<RawRecord> {
        self.records.iter().map(|r| r.fields.clone()).collect()
    }
}

// ── RecordSource ──────────────────────────────────────────────────────────────

/// Supplies the raw record collection for one department.
pub trait RecordSource {
    /// Fetch every record for `department`.
    ///
    /// A department with no records yields
    /// [`ReportError::DepartmentNotFound`]; retrieval failures yield
    /// [`ReportError::Fetch`].
    fn fetch(&self, department: &str) -> Result<SourcePayload>;
}

/// Reject payloads that cannot yield correct sums for `department`.
///
/// Zero hits is [`ReportError::DepartmentNotFound`]. Fewer records than hits
/// means the server truncated the answer; that is
/// [`ReportError::IncompleteRecords`] unless `allow_partial` is set, in which
/// case it is only logged.
pub fn check_payload(
    department: &str,
    payload: SourcePayload,
    allow_partial: bool,
) -> Result<SourcePayload> {
    if payload.nhits == 0 {
        return Err(ReportError::DepartmentNotFound(department.to_string()));
    }
    if payload.is_truncated() {
        if !allow_partial {
            return Err(ReportError::IncompleteRecords {
                department: department.to_string(),
                received: payload.records.len(),
                available: payload.nhits,
            });
        }
        warn!(
            department,
            received = payload.records.len(),
            available = payload.nhits,
            "building report from a truncated record set"
        );
    }
    Ok(payload)
}

// ── HttpRecordSource ──────────────────────────────────────────────────────────

/// Queries the OpenDataSoft records API over HTTPS.
pub struct HttpRecordSource {
    client: reqwest::blocking::Client,
    base_url: String,
    rows: u32,
    allow_partial: bool,
}

impl HttpRecordSource {
    pub fn new(rows: u32) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, rows)
    }

    pub fn with_base_url(base_url: &str, rows: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReportError::Fetch(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            rows,
            allow_partial: false,
        })
    }

    /// Accept answers with fewer records than hits (see [`check_payload`]).
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// Query parameters for one department, newest records first.
    pub fn query(&self, department: &str) -> Vec<(&'static str, String)> {
        vec![
            ("dataset", DATASET.to_string()),
            ("q", String::new()),
            ("sort", "-date".to_string()),
            ("rows", self.rows.to_string()),
            ("facet", "date".to_string()),
            ("facet", "countrycode_iso_3166_1_alpha3".to_string()),
            ("facet", "region_min".to_string()),
            ("facet", "nom_dep_min".to_string()),
            ("facet", "sex".to_string()),
            ("refine.sex", "Tous".to_string()),
            ("refine.nom_dep_min", department.to_string()),
        ]
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch(&self, department: &str) -> Result<SourcePayload> {
        debug!("Requesting records for {} from {}", department, self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(department))
            .send()
            .map_err(|e| ReportError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Fetch(format!(
                "{} returned HTTP {}",
                self.base_url, status
            )));
        }

        let body = response
            .text()
            .map_err(|e| ReportError::Fetch(e.to_string()))?;
        let payload = SourcePayload::from_json(&body)?;

        debug!(
            "Received {} of {} records for {}",
            payload.records.len(),
            payload.nhits,
            department
        );
        check_payload(department, payload, self.allow_partial)
    }
}

// ── StaticRecordSource ────────────────────────────────────────────────────────

/// Serves a fixed payload regardless of the department requested.
pub struct StaticRecordSource {
    payload: SourcePayload,
    allow_partial: bool,
}

impl StaticRecordSource {
    pub fn new(payload: SourcePayload) -> Self {
        Self {
            payload,
            allow_partial: false,
        }
    }

    /// Accept a snapshot with fewer records than hits (see [`check_payload`]).
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// Load a payload previously written by [`crate::snapshot::save_snapshot`].
    pub fn from_snapshot(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)?;
        Ok(Self::new(SourcePayload::from_json(&body)?))
    }
}

impl RecordSource for StaticRecordSource {
    fn fetch(&self, department: &str) -> Result<SourcePayload> {
        check_payload(department, self.payload.clone(), self.allow_partial)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
