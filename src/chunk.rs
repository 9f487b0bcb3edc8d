//! Paragraph-boundary text chunker.
//!
//! Splits note text into [`Chunk`]s no longer than `max_chars` characters.
//! Splitting occurs on blank-line paragraph boundaries; a paragraph that is
//! still too long is cut with an overlapping sliding window.
//!
//! # Algorithm
//!
//! 1. Normalize `\r\n` to `\n` and trim. Empty input yields no chunks.
//! 2. Split on blank lines (two or more consecutive newlines), trim each
//!    paragraph and drop empty ones.
//! 3. A paragraph of at most `max_chars` characters becomes one chunk.
//! 4. A longer paragraph is windowed: width `max_chars`, stride
//!    `max(1, max_chars - overlap_chars)`, until the window start passes the
//!    paragraph end. Each window is trimmed; blank windows are skipped.
//! 5. Chunk ids count up across the whole note: `"0"`, `"1"`, ...
//!
//! Lengths are counted in characters, so windows never split a code point.
//!
//! # Example
//!
//! ```rust
//! use study_harness::chunk::{chunk_text, ChunkOptions};
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", &ChunkOptions::default());
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].id, "1");
//! ```

use std::iter;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ChunkingConfig;
use crate::models::Chunk;

/// Window sizing for [`chunk_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Characters shared by consecutive windows of one long paragraph.
    pub overlap_chars: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chars: 950,
            overlap_chars: 120,
        }
    }
}

impl From<&ChunkingConfig> for ChunkOptions {
    fn from(cfg: &ChunkingConfig) -> Self {
        Self {
            max_chars: cfg.max_chars,
            overlap_chars: cfg.overlap_chars,
        }
    }
}

/// Split text into chunks on paragraph boundaries, respecting `max_chars`.
///
/// # Guarantees
///
/// - Empty or whitespace-only input returns an empty vector.
/// - Every chunk is non-empty and at most `max_chars` characters.
/// - Chunks appear in source order with ids `0..N` as strings.
pub fn chunk_text(text: &str, opts: &ChunkOptions) -> Vec<Chunk> {
    let normalized = text.replace("\r\n", "\n");
    let cleaned = normalized.trim();
    if cleaned.is_empty() {
        return Vec::new();
    }

    let max_chars = opts.max_chars.max(1);
    let stride = max_chars.saturating_sub(opts.overlap_chars).max(1);

    let mut chunks = Vec::new();
    let mut next_id: usize = 0;
    let mut push = |piece: &str| {
        chunks.push(Chunk {
            id: next_id.to_string(),
            text: piece.to_string(),
        });
        next_id += 1;
    };

    for para in cleaned.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Byte offset of every char start, plus the end of the string.
        let bounds: Vec<usize> = trimmed
            .char_indices()
            .map(|(i, _)| i)
            .chain(iter::once(trimmed.len()))
            .collect();
        let char_count = bounds.len() - 1;

        if char_count <= max_chars {
            push(trimmed);
            continue;
        }

        let mut start = 0;
        while start < char_count {
            let end = (start + max_chars).min(char_count);
            let piece = trimmed[bounds[start]..bounds[end]].trim();
            if !piece.is_empty() {
                push(piece);
            }
            start += stride;
        }
    }

    chunks
}

/// CLI entry point: chunk a file and print each chunk.
pub fn run_chunk(path: &Path, opts: &ChunkOptions) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read note file: {}", path.display()))?;
    let chunks = chunk_text(&text, opts);

    println!(
        "--- Chunks ({}) max_chars={} overlap_chars={} ---",
        chunks.len(),
        opts.max_chars,
        opts.overlap_chars
    );
    for chunk in &chunks {
        println!("[chunk {}] ({} chars)", chunk.id, chunk.text.chars().count());
        println!("{}", chunk.text);
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(max_chars: usize, overlap_chars: usize) -> ChunkOptions {
        ChunkOptions {
            max_chars,
            overlap_chars,
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &ChunkOptions::default()).is_empty());
        assert!(chunk_text("  \n\n \r\n\t ", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("  Hello, world!  ", &ChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "0");
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_one_chunk_per_paragraph() {
        let text = "First paragraph.\n\nSecond paragraph.\n\n\n\nThird paragraph.";
        let chunks = chunk_text(text, &ChunkOptions::default());
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["First paragraph.", "Second paragraph.", "Third paragraph."]
        );
    }

    #[test]
    fn test_single_newline_does_not_split() {
        let chunks = chunk_text("line one\nline two", &ChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "line one\nline two");
    }

    #[test]
    fn test_crlf_paragraphs() {
        let chunks = chunk_text("Alpha\r\n\r\nBeta\r\nGamma", &ChunkOptions::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Alpha");
        assert_eq!(chunks[1].text, "Beta\nGamma");
    }

    #[test]
    fn test_paragraph_exactly_max_is_one_chunk() {
        let para = "x".repeat(40);
        let chunks = chunk_text(&para, &opts(40, 10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, para);
    }

    #[test]
    fn test_sliding_window_positions() {
        // 25 chars, width 10, stride 7: starts at 0, 7, 14, 21.
        let para = "abcdefghijklmnopqrstuvwxy";
        let chunks = chunk_text(para, &opts(10, 3));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxy"]);
    }

    #[test]
    fn test_windows_cover_paragraph() {
        let para: String = (0..500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let o = opts(60, 15);
        let chunks = chunk_text(&para, &o);
        let stride = o.max_chars - o.overlap_chars;

        // Dropping each window's overlap with its predecessor rebuilds the text.
        let mut rebuilt = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(&c.text);
            } else {
                let already = rebuilt.chars().count() - i * stride;
                rebuilt.extend(c.text.chars().skip(already));
            }
        }
        assert_eq!(rebuilt, para);
    }

    #[test]
    fn test_overlap_not_smaller_than_width_still_advances() {
        let chunks = chunk_text("abcdef", &opts(3, 5));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "bcd", "cde", "def", "ef", "f"]);
    }

    #[test]
    fn test_chunk_bounds_and_unique_ids() {
        let text = (0..40)
            .map(|i| format!("Paragraph number {} {}", i, "word ".repeat(i)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_text(&text, &opts(50, 10));
        let mut seen = std::collections::HashSet::new();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.id, i.to_string(), "ids count up across the document");
            assert!(seen.insert(c.id.clone()));
            let len = c.text.chars().count();
            assert!(len >= 1 && len <= 50, "chunk {} has {} chars", c.id, len);
        }
    }

    #[test]
    fn test_blank_windows_skipped() {
        let para = format!("a{}b", " ".repeat(30));
        let chunks = chunk_text(&para, &opts(10, 0));
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
        assert_eq!(chunks.first().map(|c| c.text.as_str()), Some("a"));
        assert_eq!(chunks.last().map(|c| c.text.as_str()), Some("b"));
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let para = "┌──────────────────┐│ Hello world      │└──────────────────┘";
        let chunks = chunk_text(para, &opts(7, 2));
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.text.chars().count() <= 7);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        assert_eq!(
            chunk_text(text, &opts(3, 1)),
            chunk_text(text, &opts(3, 1))
        );
    }
}
