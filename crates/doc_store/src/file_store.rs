//! File-based document store implementation.
//!
//! # Directory Structure
//!
//! ```text
//! data/
//! ├── store.json          # Store metadata (next document id)
//! └── documents/
//!     └── {doc_id}.json   # Document record: fields plus grant set
//! ```
//!
//! A document and its grants live in one file. Every write goes to a
//! temporary file that is renamed over the old record, so readers see either
//! the previous record or the new one.

use dms_model::{Document, DocumentId, DocumentPatch, DocumentRecord, GrantSet, NewDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::storage::{DocumentStore, StorageError, StorageResult};

const METADATA_FILE: &str = "store.json";
const DOCUMENTS_DIR: &str = "documents";
const RECORD_EXTENSION: &str = "json";

/// Metadata stored for the whole store
#[derive(Debug, Serialize, Deserialize)]
struct StoreMetadata {
    next_id: u64,
}

impl Default for StoreMetadata {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

/// File-based implementation of `DocumentStore`
///
/// # Thread Safety
///
/// Each document has its own lock so that writes to different documents
/// proceed in parallel while writes to the same document are serialized.
/// Id allocation is guarded by the metadata lock.
pub struct FileDocumentStore {
    /// Base directory for all store data
    base_path: PathBuf,
    metadata: Mutex<StoreMetadata>,
    /// Per-document locks
    document_locks: Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

impl FileDocumentStore {
    /// Open (or create) a store rooted at the given path
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or existing
    /// metadata cannot be read.
    pub fn open(base_path: impl AsRef<Path>) -> StorageResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(base_path.join(DOCUMENTS_DIR))?;

        let store = Self {
            base_path,
            metadata: Mutex::new(StoreMetadata::default()),
            document_locks: Mutex::new(HashMap::new()),
        };

        let metadata = store.load_metadata()?;
        tracing::debug!(
            "Opened document store at {:?} (next id {})",
            store.base_path,
            metadata.next_id
        );
        *store.lock_metadata()? = metadata;

        Ok(store)
    }

    /// Base directory of the store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn metadata_path(&self) -> PathBuf {
        self.base_path.join(METADATA_FILE)
    }

    fn documents_dir(&self) -> PathBuf {
        self.base_path.join(DOCUMENTS_DIR)
    }

    fn record_path(&self, id: DocumentId) -> PathBuf {
        self.documents_dir()
            .join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    /// Load metadata, reconstructing it from the documents directory when
    /// the file is missing or behind the stored records.
    fn load_metadata(&self) -> StorageResult<StoreMetadata> {
        let path = self.metadata_path();
        let mut metadata = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)
                .map_err(|e| StorageError::DeserializationError(e.to_string()))?
        } else {
            StoreMetadata::default()
        };

        let highest = self.stored_ids()?.into_iter().max().map(|id| id.0).unwrap_or(0);
        if metadata.next_id <= highest {
            tracing::warn!(
                "Store metadata is behind stored records, advancing next id to {}",
                highest + 1
            );
            metadata.next_id = highest + 1;
            self.save_metadata(&metadata)?;
        }

        Ok(metadata)
    }

    fn save_metadata(&self, metadata: &StoreMetadata) -> StorageResult<()> {
        write_atomic(&self.metadata_path(), metadata)
    }

    /// Ids of all records on disk, ascending
    fn stored_ids(&self) -> StorageResult<Vec<DocumentId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(self.documents_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let parsed = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<DocumentId>().ok());

            match parsed {
                Some(id) => ids.push(id),
                None => tracing::warn!("Skipping unrecognized file {:?}", path),
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn read_record(&self, id: DocumentId) -> StorageResult<Option<DocumentRecord>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let record = serde_json::from_reader(reader).map_err(|e| {
            StorageError::DeserializationError(format!("Failed to parse document {}: {}", id, e))
        })?;
        Ok(Some(record))
    }

    fn write_record(&self, record: &DocumentRecord) -> StorageResult<()> {
        write_atomic(&self.record_path(record.document.id), record)
    }

    fn lock_metadata(&self) -> StorageResult<MutexGuard<'_, StoreMetadata>> {
        self.metadata
            .lock()
            .map_err(|_| StorageError::LockPoisoned("store metadata".to_string()))
    }

    /// Get or create the lock for one document
    fn document_lock(&self, id: DocumentId) -> StorageResult<Arc<Mutex<()>>> {
        let mut locks = self
            .document_locks
            .lock()
            .map_err(|_| StorageError::LockPoisoned("document lock table".to_string()))?;
        Ok(locks.entry(id).or_default().clone())
    }

    /// Drop the lock entry for `id` when no other caller holds it
    fn release_lock(&self, id: DocumentId, lock: &Arc<Mutex<()>>) -> StorageResult<()> {
        let mut locks = self
            .document_locks
            .lock()
            .map_err(|_| StorageError::LockPoisoned("document lock table".to_string()))?;
        let idle = locks
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) == 2);
        if idle {
            locks.remove(&id);
        }
        Ok(())
    }

    /// Run `f` while holding the lock of one document
    fn with_document_lock<T>(
        &self,
        id: DocumentId,
        f: impl FnOnce() -> StorageResult<T>,
    ) -> StorageResult<T> {
        let lock = self.document_lock(id)?;
        let result = {
            let _guard = lock
                .lock()
                .map_err(|_| StorageError::LockPoisoned(format!("document {}", id)))?;
            f()
        };
        self.release_lock(id, &lock)?;
        result
    }

    /// Run a read-modify-write on one record while holding its lock
    fn modify_record<F>(&self, id: DocumentId, modify: F) -> StorageResult<DocumentRecord>
    where
        F: FnOnce(&mut DocumentRecord),
    {
        self.with_document_lock(id, || {
            let mut record = self
                .read_record(id)?
                .ok_or(StorageError::DocumentNotFound(id))?;
            modify(&mut record);
            self.write_record(&record)?;
            Ok(record)
        })
    }
}

/// Serialize to a temp file, then rename over the target
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let temp_path = path.with_extension("json.tmp");

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

impl DocumentStore for FileDocumentStore {
    fn create_document_with_grants(
        &self,
        document: NewDocument,
        grants: GrantSet,
    ) -> StorageResult<DocumentId> {
        let mut metadata = self.lock_metadata()?;
        let id = DocumentId(metadata.next_id);

        let record = DocumentRecord {
            document: Document::from_new(id, document),
            grants,
        };
        self.write_record(&record)?;

        metadata.next_id += 1;
        if let Err(e) = self.save_metadata(&metadata) {
            // Roll back so the record and the id counter stay in step
            metadata.next_id -= 1;
            let _ = fs::remove_file(self.record_path(id));
            return Err(e);
        }

        tracing::debug!("Stored document {} with {} grants", id, record.grants.len());
        Ok(id)
    }

    fn replace_grants(&self, id: DocumentId, grants: GrantSet) -> StorageResult<()> {
        self.modify_record(id, |record| record.grants = grants)?;
        Ok(())
    }

    fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> StorageResult<DocumentRecord> {
        self.modify_record(id, |record| {
            record.document.apply(patch);
            if let Some(grants) = &patch.grants {
                record.grants = grants.clone();
            }
        })
    }

    fn get_document(&self, id: DocumentId) -> StorageResult<Option<DocumentRecord>> {
        self.read_record(id)
    }

    fn list_documents(&self) -> StorageResult<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        for id in self.stored_ids()? {
            // A record deleted between listing and reading is skipped
            if let Some(record) = self.read_record(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn delete_document(&self, id: DocumentId) -> StorageResult<()> {
        self.with_document_lock(id, || {
            let path = self.record_path(id);
            if !path.exists() {
                return Err(StorageError::DocumentNotFound(id));
            }
            fs::remove_file(path)?;

            tracing::debug!("Deleted document {}", id);
            Ok(())
        })
    }

    fn document_exists(&self, id: DocumentId) -> StorageResult<bool> {
        Ok(self.record_path(id).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms_model::{AccessLevel, RoleId, UserId};
    use tempfile::TempDir;

    fn new_doc(title: &str, access: AccessLevel) -> NewDocument {
        NewDocument {
            title: title.to_string(),
            content: "<p>content</p>".to_string(),
            owner_id: UserId(1),
            access,
        }
    }

    #[test]
    fn test_open_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();

        assert!(temp_dir.path().join(DOCUMENTS_DIR).is_dir());
        assert!(store.list_documents().unwrap().is_empty());
    }

    #[test]
    fn test_create_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();

        let id = store
            .create_document_with_grants(
                new_doc("shared", AccessLevel::Shared),
                GrantSet::read_for([RoleId(6)]),
            )
            .unwrap();

        assert_eq!(id, DocumentId(1));
        assert!(temp_dir.path().join("documents/1.json").exists());

        let record = store.load_document(id).unwrap();
        assert_eq!(record.document.title, "shared");
        assert_eq!(record.document.access, AccessLevel::Shared);
        assert_eq!(record.grants, GrantSet::read_for([RoleId(6)]));
    }

    #[test]
    fn test_record_file_uses_numeric_codes() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let id = store
            .create_document_with_grants(
                new_doc("shared", AccessLevel::Shared),
                GrantSet::read_for([RoleId(6)]),
            )
            .unwrap();

        let raw = fs::read_to_string(store.record_path(id)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["document"]["access"], 3);
        assert_eq!(value["grants"]["6"], 3);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileDocumentStore::open(temp_dir.path()).unwrap();
            store
                .create_document_with_grants(new_doc("a", AccessLevel::Public), GrantSet::new())
                .unwrap();
            store
                .create_document_with_grants(new_doc("b", AccessLevel::Private), GrantSet::new())
                .unwrap();
        }

        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let titles: Vec<_> = store
            .list_documents()
            .unwrap()
            .into_iter()
            .map(|r| r.document.title)
            .collect();
        assert_eq!(titles, vec!["a", "b"]);

        let id = store
            .create_document_with_grants(new_doc("c", AccessLevel::Public), GrantSet::new())
            .unwrap();
        assert_eq!(id, DocumentId(3));
    }

    #[test]
    fn test_missing_metadata_is_reconstructed() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileDocumentStore::open(temp_dir.path()).unwrap();
            for title in ["a", "b", "c"] {
                store
                    .create_document_with_grants(new_doc(title, AccessLevel::Public), GrantSet::new())
                    .unwrap();
            }
        }
        fs::remove_file(temp_dir.path().join(METADATA_FILE)).unwrap();

        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let id = store
            .create_document_with_grants(new_doc("d", AccessLevel::Public), GrantSet::new())
            .unwrap();
        assert_eq!(id, DocumentId(4));
    }

    #[test]
    fn test_update_and_replace_grants() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let id = store
            .create_document_with_grants(
                new_doc("a", AccessLevel::Shared),
                GrantSet::read_for([RoleId(4), RoleId(6)]),
            )
            .unwrap();

        store.replace_grants(id, GrantSet::read_for([RoleId(5)])).unwrap();
        assert_eq!(
            store.load_document(id).unwrap().grants,
            GrantSet::read_for([RoleId(5)])
        );

        let patch = DocumentPatch {
            access: Some(AccessLevel::Private),
            grants: Some(GrantSet::new()),
            ..Default::default()
        };
        let updated = store.update_document(id, &patch).unwrap();
        assert_eq!(updated.document.access, AccessLevel::Private);
        assert!(updated.grants.is_empty());
        assert_eq!(store.load_document(id).unwrap(), updated);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let id = store
            .create_document_with_grants(new_doc("a", AccessLevel::Public), GrantSet::new())
            .unwrap();
        store
            .update_document(
                id,
                &DocumentPatch {
                    title: Some("b".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join(DOCUMENTS_DIR))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_corrupt_record_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        fs::write(store.record_path(DocumentId(1)), "{not json").unwrap();

        assert!(matches!(
            store.get_document(DocumentId(1)),
            Err(StorageError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_unrecognized_files_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("documents/notes.txt"), "hello").unwrap();
        fs::write(temp_dir.path().join("documents/draft.json"), "{}").unwrap();

        assert!(store.list_documents().unwrap().is_empty());
    }

    #[test]
    fn test_delete_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let id = store
            .create_document_with_grants(new_doc("a", AccessLevel::Public), GrantSet::new())
            .unwrap();

        store.delete_document(id).unwrap();
        assert!(!store.document_exists(id).unwrap());
        assert_eq!(
            store.delete_document(id),
            Err(StorageError::DocumentNotFound(id))
        );
    }

    #[test]
    fn test_lock_entries_are_dropped_after_use() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();
        let id = store
            .create_document_with_grants(new_doc("a", AccessLevel::Shared), GrantSet::new())
            .unwrap();

        store
            .replace_grants(id, GrantSet::read_for([RoleId(6)]))
            .unwrap();
        assert!(store.document_locks.lock().unwrap().is_empty());

        store.delete_document(id).unwrap();
        assert!(store.document_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_metadata_write_rolls_back_create() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::open(temp_dir.path()).unwrap();

        // A directory in place of store.json makes the metadata rename fail
        let metadata_path = temp_dir.path().join(METADATA_FILE);
        fs::create_dir(&metadata_path).unwrap();

        let result = store.create_document_with_grants(
            new_doc("a", AccessLevel::Shared),
            GrantSet::read_for([RoleId(6)]),
        );
        assert!(matches!(result, Err(StorageError::IoError(_))));
        assert!(store.list_documents().unwrap().is_empty());
        assert!(!store.document_exists(DocumentId(1)).unwrap());

        fs::remove_dir(&metadata_path).unwrap();
        let id = store
            .create_document_with_grants(new_doc("b", AccessLevel::Public), GrantSet::new())
            .unwrap();
        assert_eq!(id, DocumentId(1));
    }
}
