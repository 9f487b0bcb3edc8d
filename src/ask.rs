//! Grounded answers with citations.
//!
//! There is no text generation: the answer is a fixed pointer back to the
//! notes, and the substance is the list of cited chunks. Every answer is
//! checked against [`validate_answer`] before it is handed to a caller.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::chunk::ChunkOptions;
use crate::config::Config;
use crate::detect::detect;
use crate::ingest::submit_note_file;
use crate::models::ScoredChunk;
use crate::retrieve::retrieve_top_k;
use crate::store::{InMemoryRepository, Repository};

/// Characters of chunk text quoted in a citation.
pub const EXCERPT_CHARS: usize = 240;

const ANSWER_TEXT: &str =
    "Here’s what your notes say (grounded summary). Review the cited chunks for exact wording.";

const ANSWER_CHARS: (usize, usize) = (10, 2000);
const MAX_CITATIONS: usize = 10;
const DOC_TITLE_CHARS: (usize, usize) = (1, 80);
const CHUNK_ID_CHARS: (usize, usize) = (3, 60);
const EXCERPT_LIMIT_CHARS: (usize, usize) = (1, 400);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub doc_title: String,
    pub chunk_id: String,
    pub score: f64,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// First [`EXCERPT_CHARS`] characters, with `…` appended when cut.
pub fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push('…');
    }
    out
}

pub fn build_answer(hits: &[ScoredChunk]) -> Answer {
    Answer {
        answer: ANSWER_TEXT.to_string(),
        citations: hits
            .iter()
            .map(|h| Citation {
                doc_title: h.chunk.doc_title.clone(),
                chunk_id: h.chunk.chunk_id.clone(),
                score: h.score,
                excerpt: excerpt(&h.chunk.text),
            })
            .collect(),
    }
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        bail!("{} must be {}..={} characters, got {}", field, min, max, len);
    }
    Ok(())
}

/// Enforce the answer output schema.
pub fn validate_answer(answer: &Answer) -> Result<()> {
    check_len("answer", &answer.answer, ANSWER_CHARS)?;
    if answer.citations.len() > MAX_CITATIONS {
        bail!(
            "at most {} citations allowed, got {}",
            MAX_CITATIONS,
            answer.citations.len()
        );
    }
    for c in &answer.citations {
        check_len("citation.docTitle", &c.doc_title, DOC_TITLE_CHARS)?;
        check_len("citation.chunkId", &c.chunk_id, CHUNK_ID_CHARS)?;
        check_len("citation.excerpt", &c.excerpt, EXCERPT_LIMIT_CHARS)?;
        if !c.score.is_finite() || c.score < 0.0 {
            bail!("citation.score must be a non-negative number, got {}", c.score);
        }
    }
    Ok(())
}

/// Retrieve, build, and validate an answer from a repository.
pub fn answer_question(repo: &dyn Repository, question: &str, top_k: usize) -> Result<Answer> {
    let hits = retrieve_top_k(question, top_k, repo.all_chunks());
    let answer = build_answer(&hits);
    validate_answer(&answer)?;
    Ok(answer)
}

/// CLI entry point: load note files into a fresh repository and answer.
pub fn run_ask(config: &Config, question: &str, notes: &[PathBuf], top_k: Option<usize>) -> Result<()> {
    let question_risk = detect(question);
    if question_risk.blocked {
        bail!(
            "question blocked for safety (matched {})",
            question_risk.matched.join(", ")
        );
    }

    let top_k = top_k.unwrap_or(config.retrieval.default_top_k);
    if !(1..=config.retrieval.max_top_k).contains(&top_k) {
        bail!("--top-k must be in [1, {}]", config.retrieval.max_top_k);
    }

    let opts = ChunkOptions::from(&config.chunking);
    let repo = InMemoryRepository::new();
    for path in notes {
        let receipt = submit_note_file(&repo, path, &opts)?;
        eprintln!(
            "loaded {} ({} chunks{})",
            path.display(),
            receipt.chunk_count,
            if receipt.injection_risk.risky { ", flagged" } else { "" }
        );
    }

    let answer = answer_question(&repo, question, top_k)?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::ingest::submit_note;
    use crate::models::StoredChunk;
    use std::sync::Arc;

    fn hit(title: &str, chunk_id: &str, text: &str, score: f64) -> ScoredChunk {
        ScoredChunk {
            chunk: StoredChunk {
                doc_id: "d".to_string(),
                doc_title: title.to_string(),
                chunk_id: chunk_id.to_string(),
                text: text.to_string(),
            },
            score,
        }
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_excerpt_truncates_with_ellipsis() {
        let long = "y".repeat(300);
        let e = excerpt(&long);
        assert_eq!(e.chars().count(), EXCERPT_CHARS + 1);
        assert!(e.ends_with('…'));
    }

    #[test]
    fn test_build_answer_cites_hits_in_order() {
        let answer = build_answer(&[
            hit("Logic", "d:0", "AND gate", 0.04),
            hit("Logic", "d:1", "OR gate", 0.02),
        ]);
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].chunk_id, "d:0");
        assert!(validate_answer(&answer).is_ok());
    }

    #[test]
    fn test_validate_rejects_long_title() {
        let answer = build_answer(&[hit(&"t".repeat(81), "d:0", "text", 0.1)]);
        let err = validate_answer(&answer).unwrap_err();
        assert!(err.to_string().contains("docTitle"));
    }

    #[test]
    fn test_validate_rejects_short_chunk_id() {
        let answer = build_answer(&[hit("Logic", "d0", "text", 0.1)]);
        assert!(validate_answer(&answer).is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_citations() {
        let hits: Vec<ScoredChunk> = (0..11)
            .map(|i| hit("Logic", &format!("d:{}", i), "text", 0.1))
            .collect();
        assert!(validate_answer(&build_answer(&hits)).is_err());
    }

    #[test]
    fn test_answer_question_end_to_end() {
        let repo = InMemoryRepository::with_ids(Arc::new(SequentialIds::new("note")));
        submit_note(
            &repo,
            "Logic",
            "AND gate outputs 1 only if all inputs are 1.\n\nOR gate outputs 1 if any input is 1.",
            &ChunkOptions::default(),
        );

        let answer = answer_question(&repo, "AND gate", 5).unwrap();
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].chunk_id, "note0:0");
        assert!(answer.citations[0].score > answer.citations[1].score);
    }

    #[test]
    fn test_no_hits_is_valid_answer() {
        let repo = InMemoryRepository::new();
        let answer = answer_question(&repo, "anything at all", 5).unwrap();
        assert!(answer.citations.is_empty());
    }
}
