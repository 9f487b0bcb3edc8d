//! In-memory [`Repository`] backed by a `Vec` behind `std::sync::RwLock`.
//!
//! Nothing is persisted; the repository lives as long as the value that
//! owns it (for the server, the process).

use std::sync::{Arc, PoisonError, RwLock};

use crate::ids::{IdGenerator, RandomIds};
use crate::models::{Document, DocumentSummary, NewDocument, StoredChunk};

use super::Repository;

pub struct InMemoryRepository {
    docs: RwLock<Vec<Document>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::with_ids(Arc::new(RandomIds))
    }

    /// Use a specific id source for document ids.
    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            ids,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for InMemoryRepository {
    fn add_document(&self, doc: NewDocument) -> String {
        let doc_id = self.ids.next_id();
        let stored = Document {
            doc_id: doc_id.clone(),
            title: doc.title,
            raw_text_length: doc.raw_text_length,
            injection_risk: doc.injection_risk,
            chunks: doc.chunks,
        };
        // Single push under the write lock: readers see all chunks or none.
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stored);
        doc_id
    }

    fn all_chunks(&self) -> Vec<StoredChunk> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.iter()
            .flat_map(|doc| {
                doc.chunks.iter().map(move |c| StoredChunk {
                    doc_id: doc.doc_id.clone(),
                    doc_title: doc.title.clone(),
                    chunk_id: format!("{}:{}", doc.doc_id, c.id),
                    text: c.text.clone(),
                })
            })
            .collect()
    }

    fn get_document(&self, doc_id: &str) -> Option<Document> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.iter().find(|d| d.doc_id == doc_id).cloned()
    }

    fn list_documents(&self) -> Vec<DocumentSummary> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.iter()
            .map(|d| DocumentSummary {
                doc_id: d.doc_id.clone(),
                title: d.title.clone(),
                raw_text_length: d.raw_text_length,
                chunk_count: d.chunks.len(),
                injection_risk: d.injection_risk.clone(),
            })
            .collect()
    }
}
