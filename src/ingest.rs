//! Note ingestion pipeline.
//!
//! ```text
//! text ──▶ detect ──▶ chunk ──▶ Repository::add_document ──▶ NoteReceipt
//! ```
//!
//! Notes are stored even when the detector flags them; the detection result
//! travels with the document so later consumers can treat it cautiously.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::chunk::{chunk_text, ChunkOptions};
use crate::detect::detect;
use crate::models::{DetectionResult, NewDocument};
use crate::store::Repository;

/// Result of storing one note.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteReceipt {
    pub ok: bool,
    pub doc_id: String,
    pub chunk_count: usize,
    pub injection_risk: DetectionResult,
}

/// Scan, chunk, and store a note.
pub fn submit_note(
    repo: &dyn Repository,
    title: &str,
    text: &str,
    opts: &ChunkOptions,
) -> NoteReceipt {
    let injection_risk = detect(text);
    let chunks = chunk_text(text, opts);
    let chunk_count = chunks.len();

    let doc_id = repo.add_document(NewDocument {
        title: title.to_string(),
        raw_text_length: text.chars().count(),
        injection_risk: injection_risk.clone(),
        chunks,
    });

    if injection_risk.risky {
        tracing::warn!(
            doc_id = %doc_id,
            blocked = injection_risk.blocked,
            matched = ?injection_risk.matched,
            "stored note flagged by injection detector"
        );
    }
    tracing::info!(doc_id = %doc_id, chunk_count, "note stored");

    NoteReceipt {
        ok: true,
        doc_id,
        chunk_count,
        injection_risk,
    }
}

/// Read a note from disk and submit it, using the file stem as its title.
pub fn submit_note_file(
    repo: &dyn Repository,
    path: &Path,
    opts: &ChunkOptions,
) -> Result<NoteReceipt> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read note file: {}", path.display()))?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(submit_note(repo, &title, &text, opts))
}
