//! Extraction records and the run manifest - the output of a document run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::level::ExtractionLevel;

/// Terminal state of one (entity, extraction type) dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// The extractor returned a structured payload.
    Success,

    /// The extractor call failed; the error is recorded, siblings ran on.
    Failed,
}

/// One extraction result with full traceability back into the hierarchy.
///
/// A record exists for every dispatched (entity, extraction type) pair,
/// whether the extractor succeeded or failed. The payload is opaque to the
/// engine - its domain fields belong to the extractor and the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Unique id for this record instance.
    pub id: Uuid,

    /// Source document the record was derived from.
    pub source_id: String,

    /// Hierarchy level the extraction ran at.
    pub context_level: ExtractionLevel,

    /// Id of the hierarchy entity (chapter id, section id, or chunk id).
    pub context_id: String,

    /// Ids of the chunks whose text was actually fed to the extractor.
    ///
    /// Reflects truncation: after an over-budget combination this can be
    /// a prefix of the entity's chunks, or empty.
    pub chunk_ids: Vec<String>,

    /// Which kind of knowledge was extracted (e.g. "methodology").
    pub extraction_type: String,

    /// Whether the dispatch succeeded.
    pub status: RecordStatus,

    /// The extractor's structured payload, present on success.
    pub payload: Option<Value>,

    /// Failure description, present on failure.
    pub error: Option<String>,

    /// When the dispatch completed.
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionRecord {
    /// Whether this record carries a successful payload.
    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}

/// Per-(level, type) success/failure tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Level the tally covers.
    pub level: ExtractionLevel,

    /// Extraction type the tally covers.
    pub extraction_type: String,

    /// Dispatches that produced a payload.
    pub succeeded: usize,

    /// Dispatches that failed.
    pub failed: usize,
}

/// Operator-visible summary of a document extraction run.
///
/// Partial success is a normal terminal state: a run with failed entries
/// still completes and still returns every sibling record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Source document the run covered.
    pub source_id: String,

    /// Chapters found in the hierarchy.
    pub chapters: usize,

    /// Sections found across all chapters.
    pub sections: usize,

    /// Total chunks in the document.
    pub chunks: usize,

    /// Per-(level, type) tallies in dispatch order.
    pub entries: Vec<ManifestEntry>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl RunManifest {
    /// Total successful dispatches.
    pub fn total_succeeded(&self) -> usize {
        self.entries.iter().map(|e| e.succeeded).sum()
    }

    /// Total failed dispatches.
    pub fn total_failed(&self) -> usize {
        self.entries.iter().map(|e| e.failed).sum()
    }

    /// Whether every dispatch succeeded.
    pub fn is_success(&self) -> bool {
        self.total_failed() == 0
    }
}

/// Everything a document run produces: the records plus their manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRun {
    /// All extraction records in deterministic aggregate order.
    pub records: Vec<ExtractionRecord>,

    /// Success/failure summary of the run.
    pub manifest: RunManifest,
}
