//! In-memory document store implementation.
//!
//! `MemoryDocumentStore` keeps every record in a `BTreeMap` behind a single
//! `RwLock`. Each call takes the lock once, so a document and its grants are
//! always updated together. Data is lost on restart.

use dms_model::{Document, DocumentId, DocumentPatch, DocumentRecord, GrantSet, NewDocument};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::storage::{DocumentStore, StorageError, StorageResult};

struct MemoryState {
    /// Next id to hand out
    next_id: u64,
    records: BTreeMap<DocumentId, DocumentRecord>,
}

/// In-memory implementation of `DocumentStore`
///
/// The store is thread-safe and can be shared across threads using `Arc`.
pub struct MemoryDocumentStore {
    state: RwLock<MemoryState>,
}

impl MemoryDocumentStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }

    /// Get the number of documents in the store
    pub fn document_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.records.len())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| StorageError::LockPoisoned("memory store".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| StorageError::LockPoisoned("memory store".to_string()))
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create_document_with_grants(
        &self,
        document: NewDocument,
        grants: GrantSet,
    ) -> StorageResult<DocumentId> {
        let mut state = self.write()?;
        let id = DocumentId(state.next_id);
        state.next_id += 1;

        let record = DocumentRecord {
            document: Document::from_new(id, document),
            grants,
        };
        state.records.insert(id, record);

        Ok(id)
    }

    fn replace_grants(&self, id: DocumentId, grants: GrantSet) -> StorageResult<()> {
        let mut state = self.write()?;
        let record = state
            .records
            .get_mut(&id)
            .ok_or(StorageError::DocumentNotFound(id))?;
        record.grants = grants;
        Ok(())
    }

    fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> StorageResult<DocumentRecord> {
        let mut state = self.write()?;
        let record = state
            .records
            .get_mut(&id)
            .ok_or(StorageError::DocumentNotFound(id))?;

        record.document.apply(patch);
        if let Some(grants) = &patch.grants {
            record.grants = grants.clone();
        }

        Ok(record.clone())
    }

    fn get_document(&self, id: DocumentId) -> StorageResult<Option<DocumentRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    fn list_documents(&self) -> StorageResult<Vec<DocumentRecord>> {
        Ok(self.read()?.records.values().cloned().collect())
    }

    fn delete_document(&self, id: DocumentId) -> StorageResult<()> {
        self.write()?
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::DocumentNotFound(id))
    }

    fn document_exists(&self, id: DocumentId) -> StorageResult<bool> {
        Ok(self.read()?.records.contains_key(&id))
    }
}
