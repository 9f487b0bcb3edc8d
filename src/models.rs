//! Core data models used throughout Study Harness.
//!
//! These types represent the notes, chunks, retrieval hits, and study
//! sessions that flow through the ingestion, retrieval, and planning
//! pipeline. Everything serialized over HTTP uses camelCase field names.

use serde::{Deserialize, Serialize};

/// A bounded slice of a single note's text.
///
/// `id` is a document-local counter (`"0"`, `"1"`, ...) assigned in source
/// order by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
}

/// Outcome of scanning a piece of text for adversarial signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub blocked: bool,
    pub risky: bool,
    /// Identifiers of the signatures that matched, in signature-table order.
    pub matched: Vec<String>,
}

/// Input to [`Repository::add_document`](crate::store::Repository::add_document).
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub raw_text_length: usize,
    pub injection_risk: DetectionResult,
    pub chunks: Vec<Chunk>,
}

/// A stored note. Never mutated after it is added.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    pub raw_text_length: usize,
    pub injection_risk: DetectionResult,
    pub chunks: Vec<Chunk>,
}

/// A chunk together with the document it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredChunk {
    pub doc_id: String,
    pub doc_title: String,
    /// Globally unique: `"{doc_id}:{local chunk id}"`.
    pub chunk_id: String,
    pub text: String,
}

/// A [`StoredChunk`] scored against one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: StoredChunk,
    pub score: f64,
}

/// Lightweight listing entry for a stored note.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub doc_id: String,
    pub title: String,
    pub raw_text_length: usize,
    pub chunk_count: usize,
    pub injection_risk: DetectionResult,
}

/// A single study session. Timestamps are floating local times
/// (`YYYYMMDDTHHMMSS`, no zone or offset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_local: String,
    pub end_local: String,
}

/// A week of generated study sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    /// Free-text zone label. Never used for time conversion.
    pub timezone: String,
    pub events: Vec<StudySession>,
}
