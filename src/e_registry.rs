use crate::e_diagnostic::Diagnostic;
use crate::e_document::DocumentId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Published diagnostics, one slot per document.
///
/// Every update replaces the whole slot; nothing is ever merged.
#[derive(Debug, Default)]
pub struct DiagnosticRegistry {
    entries: Mutex<HashMap<DocumentId, Vec<Diagnostic>>>,
}

impl DiagnosticRegistry {
    pub fn new() -> Self {
        DiagnosticRegistry::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentId, Vec<Diagnostic>>> {
        // a panic while holding the lock cannot leave a half-written slot
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the document's diagnostics. An empty list clears the slot.
    pub fn set(&self, id: &DocumentId, diagnostics: Vec<Diagnostic>) {
        let mut entries = self.lock();
        if diagnostics.is_empty() {
            entries.remove(id);
        } else {
            entries.insert(id.clone(), diagnostics);
        }
    }

    pub fn clear(&self, id: &DocumentId) {
        self.lock().remove(id);
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }

    pub fn get(&self, id: &DocumentId) -> Option<Vec<Diagnostic>> {
        self.lock().get(id).cloned()
    }

    /// All entries ordered by document id.
    pub fn snapshot(&self) -> Vec<(DocumentId, Vec<Diagnostic>)> {
        let mut all: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, diags)| (id.clone(), diags.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Number of documents that currently have diagnostics.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
