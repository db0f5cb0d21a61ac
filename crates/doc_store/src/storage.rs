//! Storage abstraction for documents and grants.
//!
//! The `DocumentStore` trait is the narrow persistence contract of the
//! document core. Implementations must apply each mutating call atomically:
//! a document and its grant set are either both written or both left as they
//! were.

use dms_model::{DocumentId, DocumentPatch, DocumentRecord, GrantSet, NewDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A lock was poisoned by a panicking writer
    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),

    /// Internal storage error
    #[error("Internal storage error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document storage backends
///
/// # Thread Safety
///
/// The trait methods take `&self`; implementations use interior locking and
/// can be shared across threads behind an `Arc`.
///
/// # Atomicity
///
/// `create_document_with_grants`, `replace_grants`, `update_document` and
/// `delete_document` each either fully apply or leave the stored record
/// untouched. Serializing concurrent writers to the same document is the
/// caller's job; the store only guarantees that no single call is observed
/// half-applied.
pub trait DocumentStore: Send + Sync {
    /// Persist a new document together with its grants.
    ///
    /// Returns the freshly assigned document id.
    fn create_document_with_grants(
        &self,
        document: NewDocument,
        grants: GrantSet,
    ) -> StorageResult<DocumentId>;

    /// Replace the whole grant set of a document
    fn replace_grants(&self, id: DocumentId, grants: GrantSet) -> StorageResult<()>;

    /// Apply a patch: changed fields and, when present, a full grant
    /// replacement, as one write.
    ///
    /// Returns the updated record.
    fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> StorageResult<DocumentRecord>;

    /// Get a document and its grants
    ///
    /// Returns `None` if the document does not exist.
    fn get_document(&self, id: DocumentId) -> StorageResult<Option<DocumentRecord>>;

    /// All stored documents in id order
    fn list_documents(&self) -> StorageResult<Vec<DocumentRecord>>;

    /// Remove a document and its grants
    fn delete_document(&self, id: DocumentId) -> StorageResult<()>;

    /// Get a document, failing with `DocumentNotFound` if it is missing
    fn load_document(&self, id: DocumentId) -> StorageResult<DocumentRecord> {
        self.get_document(id)?
            .ok_or(StorageError::DocumentNotFound(id))
    }

    /// Check if a document exists in storage
    fn document_exists(&self, id: DocumentId) -> StorageResult<bool> {
        Ok(self.get_document(id)?.is_some())
    }

    /// Get storage statistics
    fn get_stats(&self) -> StorageResult<StoreStats> {
        let records = self.list_documents()?;
        Ok(StoreStats {
            document_count: records.len(),
            grant_count: records.iter().map(|r| r.grants.len()).sum(),
            shared_count: records
                .iter()
                .filter(|r| r.document.access.is_shared())
                .count(),
        })
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn create_document_with_grants(
        &self,
        document: NewDocument,
        grants: GrantSet,
    ) -> StorageResult<DocumentId> {
        (**self).create_document_with_grants(document, grants)
    }

    fn replace_grants(&self, id: DocumentId, grants: GrantSet) -> StorageResult<()> {
        (**self).replace_grants(id, grants)
    }

    fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> StorageResult<DocumentRecord> {
        (**self).update_document(id, patch)
    }

    fn get_document(&self, id: DocumentId) -> StorageResult<Option<DocumentRecord>> {
        (**self).get_document(id)
    }

    fn list_documents(&self) -> StorageResult<Vec<DocumentRecord>> {
        (**self).list_documents()
    }

    fn delete_document(&self, id: DocumentId) -> StorageResult<()> {
        (**self).delete_document(id)
    }
}

/// Statistics about stored data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of stored documents
    pub document_count: usize,
    /// Number of role grants across all documents
    pub grant_count: usize,
    /// Number of documents shared with roles
    pub shared_count: usize,
}
