//! Storage abstraction for submitted notes.
//!
//! The [`Repository`] trait is the only stateful seam in the pipeline. It is
//! append-only: documents are added whole and never mutated or removed.
//! Implementations must make each [`add_document`](Repository::add_document)
//! atomically visible, so [`all_chunks`](Repository::all_chunks) never
//! observes half of a document's chunks.
//!
//! Implementations must be `Send + Sync` so one instance can be shared by
//! every HTTP handler.

pub mod memory;

pub use memory::InMemoryRepository;

use crate::models::{Document, DocumentSummary, NewDocument, StoredChunk};

/// Append-only document store consumed by ingestion and retrieval.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add_document`](Repository::add_document) | Store a chunked note, returning its id |
/// | [`all_chunks`](Repository::all_chunks) | Every stored chunk, in insertion order |
/// | [`get_document`](Repository::get_document) | One document with its chunks |
/// | [`list_documents`](Repository::list_documents) | Summaries of every document |
pub trait Repository: Send + Sync {
    /// Store a document and return its freshly minted id.
    fn add_document(&self, doc: NewDocument) -> String;

    /// All chunks of all documents: documents in insertion order, chunks in
    /// source order within each document.
    fn all_chunks(&self) -> Vec<StoredChunk>;

    fn get_document(&self, doc_id: &str) -> Option<Document>;

    fn list_documents(&self) -> Vec<DocumentSummary>;
}
