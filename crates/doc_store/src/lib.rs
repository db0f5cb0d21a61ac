//! Document storage for Shift DMS.
//!
//! This crate defines the `DocumentStore` trait, the storage contract used by
//! the mutation gateway, together with two backends:
//!
//! - `MemoryDocumentStore`: in-memory, for tests and development
//! - `FileDocumentStore`: one JSON record per document on disk
//!
//! Every backend stores a document and its role grants as a single record,
//! so the two are always written together.
//!
//! # Example
//!
//! ```
//! use doc_store::{DocumentStore, MemoryDocumentStore};
//! use dms_model::{AccessLevel, GrantSet, NewDocument, RoleId, UserId};
//!
//! let store = MemoryDocumentStore::new();
//! let id = store
//!     .create_document_with_grants(
//!         NewDocument {
//!             title: "Roadmap".to_string(),
//!             content: "<p>Q3</p>".to_string(),
//!             owner_id: UserId(1),
//!             access: AccessLevel::Shared,
//!         },
//!         GrantSet::read_for([RoleId(4)]),
//!     )
//!     .unwrap();
//!
//! let record = store.get_document(id).unwrap().unwrap();
//! assert!(record.grants.contains_role(RoleId(4)));
//! ```

pub mod file_store;
pub mod memory_store;
pub mod storage;

pub use file_store::FileDocumentStore;
pub use memory_store::MemoryDocumentStore;
pub use storage::{DocumentStore, StorageError, StorageResult, StoreStats};
