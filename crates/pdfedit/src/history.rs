//! In-memory history of extracted documents.

use std::sync::{Mutex, MutexGuard, PoisonError};

use pdfedit_core::Document;

/// Append-only list of extracted documents, oldest first.
///
/// Shared across threads behind `&self`; every operation holds the lock for
/// its whole duration.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<Document>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Document>> {
        // Poisoning is ignored: no operation leaves the list half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, document: Document) {
        self.lock().push(document);
    }

    /// A snapshot of all entries in insertion order.
    pub fn list(&self) -> Vec<Document> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
