//! Keyword retrieval over stored chunks.
//!
//! A single linear scan with no index: every chunk is scored against the
//! query and the best `k` are kept.
//!
//! # Scoring
//!
//! 1. Tokenize the query: lowercase, replace everything that is not an ASCII
//!    letter, ASCII digit, or whitespace with a space, split on whitespace.
//! 2. For each query token of at least [`MIN_TOKEN_CHARS`] characters, add 1
//!    if the token occurs anywhere in the lower-cased chunk text. Occurrences
//!    are not counted; a token repeated in the query contributes each time.
//! 3. Divide by `max(50, chunk_chars / 10)` so long chunks do not win by
//!    sheer size and very short ones are not over-rewarded.
//! 4. Drop zero scores, sort descending (ties keep repository order), and
//!    truncate to `k`.

use std::cmp::Ordering;

use crate::models::{ScoredChunk, StoredChunk};

/// Query tokens shorter than this are ignored when scoring.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Floor of the length-normalization divisor.
const MIN_NORMALIZER: f64 = 50.0;

/// Split a query into lower-case ASCII alphanumeric tokens.
pub fn tokenize(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Length-normalized token-presence score of one chunk.
pub fn score_chunk(query_tokens: &[String], chunk_text: &str) -> f64 {
    let text = chunk_text.to_lowercase();
    let raw = query_tokens
        .iter()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|t| text.contains(t.as_str()))
        .count();

    let normalizer = MIN_NORMALIZER.max(chunk_text.chars().count() as f64 / 10.0);
    raw as f64 / normalizer
}

/// Rank `chunks` against `query` and return at most `k` hits with score > 0.
pub fn retrieve_top_k(query: &str, k: usize, chunks: Vec<StoredChunk>) -> Vec<ScoredChunk> {
    let tokens = tokenize(query);

    let mut scored: Vec<ScoredChunk> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let score = score_chunk(&tokens, &chunk.text);
            (score > 0.0).then_some(ScoredChunk { chunk, score })
        })
        .collect();

    // `sort_by` is stable, so equal scores keep repository order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: &str, text: &str) -> StoredChunk {
        StoredChunk {
            doc_id: "d".to_string(),
            doc_title: "Notes".to_string(),
            chunk_id: format!("d:{}", id),
            text: text.to_string(),
        }
    }

    fn tokens(q: &str) -> Vec<String> {
        tokenize(q)
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(tokenize("What's an AND-gate?"), vec!["what", "s", "an", "and", "gate"]);
    }

    #[test]
    fn test_tokenize_drops_non_ascii_letters() {
        assert_eq!(tokenize("café  résumé 42"), vec!["caf", "r", "sum", "42"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("  ?!  ").is_empty());
    }

    #[test]
    fn test_short_tokens_ignored() {
        assert_eq!(score_chunk(&tokens("is a of"), "this is a list of things"), 0.0);
    }

    #[test]
    fn test_presence_not_frequency() {
        let once = score_chunk(&tokens("gate"), "gate");
        let many = score_chunk(&tokens("gate"), "gate gate gate");
        assert_eq!(once, many);
        assert!((once - 1.0 / 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_query_token_counts_each_time() {
        let s = score_chunk(&tokens("gate gate"), "logic gate");
        assert!((s - 2.0 / 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_long_chunk_normalization() {
        let text = format!("gate {}", "x".repeat(995)); // 1000 chars
        let s = score_chunk(&tokens("gate"), &text);
        assert!((s - 1.0 / 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scores_excluded() {
        let chunks = vec![stored("0", "nothing relevant"), stored("1", "logic gate")];
        let hits = retrieve_top_k("gate", 5, chunks);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.chunk_id, "d:1");
    }

    #[test]
    fn test_sorted_and_truncated() {
        let chunks = vec![
            stored("0", "gate"),
            stored("1", "logic gate truth table"),
            stored("2", "truth table"),
            stored("3", "logic gate"),
        ];
        let hits = retrieve_top_k("logic gate truth table", 2, chunks);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.chunk_id, "d:1");
        for w in hits.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn test_ties_keep_repository_order() {
        let chunks = vec![stored("a", "gate one"), stored("b", "gate two"), stored("c", "gate six")];
        let hits = retrieve_top_k("gate", 3, chunks);
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["d:a", "d:b", "d:c"]);
    }

    #[test]
    fn test_k_zero_returns_nothing() {
        assert!(retrieve_top_k("gate", 0, vec![stored("0", "gate")]).is_empty());
    }

    #[test]
    fn test_and_gate_ranks_first_paragraph() {
        let chunks = vec![
            stored("0", "AND gate outputs 1 only if all inputs are 1."),
            stored("1", "OR gate outputs 1 if any input is 1."),
        ];
        let hits = retrieve_top_k("AND gate", 5, chunks);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.chunk_id, "d:0");
        assert!(hits[0].score > hits[1].score);
    }
}
