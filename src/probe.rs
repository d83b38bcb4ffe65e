//! Connectivity probe
//!
//! One forward pass: load credentials, connect, write the probe document,
//! read it back, report. Any stage failure aborts the rest of the run.

use crate::auth::ServiceAccount;
use crate::config::Config;
use crate::store::{render_fields, DocumentPath, DocumentStore, FieldValue, Fields, FirestoreClient};
use crate::types::{ProbeError, ProbeResult};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::fmt;
use tracing::{info, warn};

pub const PROBE_COLLECTION: &str = "test_connections";
pub const PROBE_DOCUMENT: &str = "ping";
pub const REPORT_LABEL: &str = "Firestore test read:";

// Largest precision loss the store may apply to a timestamp.
const TIMESTAMP_TOLERANCE_MICROS: i64 = 1000;

pub fn probe_path() -> DocumentPath {
    DocumentPath::new(PROBE_COLLECTION, PROBE_DOCUMENT)
}

/// The record written on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeDocument {
    pub ok: bool,
    pub ts: DateTime<Utc>,
}

impl ProbeDocument {
    /// A fresh probe stamped at `now`, truncated to the store's microsecond precision.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ok: true,
            ts: now.trunc_subsecs(6),
        }
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("ok".to_string(), FieldValue::BooleanValue(self.ok));
        fields.insert("ts".to_string(), FieldValue::TimestampValue(self.ts));
        fields
    }

    /// `None` if either field is missing or has the wrong type.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        Some(Self {
            ok: fields.get("ok")?.as_bool()?,
            ts: fields.get("ts")?.as_timestamp()?,
        })
    }

    /// True when `read` is this document modulo timestamp truncation.
    pub fn matches(&self, read: &ProbeDocument) -> bool {
        let lost = self.ts - read.ts;
        self.ok == read.ok
            && lost >= Duration::zero()
            && lost < Duration::microseconds(TIMESTAMP_TOLERANCE_MICROS)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub path: DocumentPath,
    pub written: ProbeDocument,
    /// Document contents as read back from the store.
    pub fields: Fields,
}

impl ProbeReport {
    pub fn read_back(&self) -> Option<ProbeDocument> {
        ProbeDocument::from_fields(&self.fields)
    }

    pub fn round_trip_matches(&self) -> bool {
        self.read_back()
            .map(|read| self.written.matches(&read))
            .unwrap_or(false)
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", REPORT_LABEL, render_fields(&self.fields))
    }
}

/// Write the probe document through `store`, then read it back.
///
/// The read is only issued once the write has completed successfully.
pub async fn run_probe<S>(store: &S, now: DateTime<Utc>) -> ProbeResult<ProbeReport>
where
    S: DocumentStore + ?Sized,
{
    let path = probe_path();
    let written = ProbeDocument::new(now);

    info!("Writing probe document {}", path);
    store.set_document(&path, &written.to_fields()).await?;

    info!("Reading probe document {}", path);
    let fields = store
        .get_document(&path)
        .await?
        .ok_or_else(|| ProbeError::NotFound(path.to_string()))?;

    let report = ProbeReport { path, written, fields };
    if !report.round_trip_matches() {
        // Another writer may have won the race, or the read was stale.
        warn!(
            "Read-back of {} differs from the value written ({})",
            report.path,
            render_fields(&report.written.to_fields())
        );
    }

    Ok(report)
}

/// Full run against Firestore as configured.
pub async fn run(config: &Config) -> ProbeResult<ProbeReport> {
    info!("Loading credentials from {}", config.credentials_path.display());
    let account = ServiceAccount::from_file(&config.credentials_path).await?;

    let store = FirestoreClient::connect(config, &account).await?;

    run_probe(&store, Utc::now()).await
}
