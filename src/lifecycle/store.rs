use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::document::FiscalDocument;
use crate::core::DocumentNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A document with the same number already exists.
    #[error("document {0} already exists")]
    Duplicate(String),

    /// The stored revision moved on since the document was read.
    #[error("document {id} is at revision {found}, expected {expected}")]
    Conflict { id: String, expected: u64, found: u64 },

    #[error("document {0} not found")]
    NotFound(String),

    /// The backing database failed.
    #[error("document storage error: {0}")]
    Backend(String),
}

/// Persistence port for numbered documents.
pub trait DocumentStore: Send + Sync {
    /// Store a new document. Fails with [`StoreError::Duplicate`] if its
    /// number is taken.
    fn insert(&self, document: &FiscalDocument) -> Result<(), StoreError>;

    fn get(&self, id: &DocumentNumber) -> Result<Option<FiscalDocument>, StoreError>;

    /// Replace the stored document, but only if its revision is still
    /// `expected_revision` (compare-and-swap).
    fn update(&self, document: &FiscalDocument, expected_revision: u64) -> Result<(), StoreError>;
}

impl<D: DocumentStore + ?Sized> DocumentStore for Arc<D> {
    fn insert(&self, document: &FiscalDocument) -> Result<(), StoreError> {
        (**self).insert(document)
    }

    fn get(&self, id: &DocumentNumber) -> Result<Option<FiscalDocument>, StoreError> {
        (**self).get(id)
    }

    fn update(&self, document: &FiscalDocument, expected_revision: u64) -> Result<(), StoreError> {
        (**self).update(document, expected_revision)
    }
}

/// Lock-guarded map of documents keyed by number.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentNumber, FiscalDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Snapshot of every stored document, ordered by number.
    pub fn all(&self) -> Vec<FiscalDocument> {
        let mut docs: Vec<_> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| a.id().cmp(b.id()));
        docs
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, document: &FiscalDocument) -> Result<(), StoreError> {
        let mut documents = self.documents.write();
        if documents.contains_key(document.id()) {
            return Err(StoreError::Duplicate(document.display_number()));
        }
        documents.insert(document.id().clone(), document.clone());
        Ok(())
    }

    fn get(&self, id: &DocumentNumber) -> Result<Option<FiscalDocument>, StoreError> {
        Ok(self.documents.read().get(id).cloned())
    }

    fn update(&self, document: &FiscalDocument, expected_revision: u64) -> Result<(), StoreError> {
        let mut documents = self.documents.write();
        let stored = documents
            .get_mut(document.id())
            .ok_or_else(|| StoreError::NotFound(document.display_number()))?;
        if stored.revision() != expected_revision {
            return Err(StoreError::Conflict {
                id: document.display_number(),
                expected: expected_revision,
                found: stored.revision(),
            });
        }
        *stored = document.clone();
        Ok(())
    }
}
