//! Document operations for Shift DMS.
//!
//! This crate sits between clients and the document store. It validates
//! create and update requests, checks them against the access evaluator and
//! persists them so that a document and its role grants never disagree.
//!
//! # Modules
//!
//! - `gateway`: create, update, open, list, share and delete operations
//! - `patch`: minimal-diff computation for updates
//! - `editor`: per-document editing state machine and editor controller
//! - `locks`: per-document serialization of writers
//! - `error`: error types for this crate
//!
//! # Example
//!
//! ```
//! use access::Requester;
//! use doc_store::MemoryDocumentStore;
//! use documents::DocumentGateway;
//! use dms_model::{AccessLevel, DocumentDraft, GrantSet, RoleId, RoleRegistry, UserId};
//!
//! let gateway = DocumentGateway::new(MemoryDocumentStore::new(), RoleRegistry::default());
//! let author = Requester::new(UserId(1), RoleId(4));
//!
//! let record = gateway
//!     .create(
//!         &author,
//!         DocumentDraft {
//!             title: "Roadmap".to_string(),
//!             content: "<p>Q3</p>".to_string(),
//!             owner_id: UserId(1),
//!             access: AccessLevel::Shared,
//!             roles: GrantSet::read_for([RoleId(4), RoleId(6)]),
//!         },
//!     )
//!     .unwrap();
//!
//! // The author's own role is implied and never stored as a grant
//! assert_eq!(record.grants, GrantSet::read_for([RoleId(6)]));
//! ```

pub mod editor;
pub mod error;
pub mod gateway;
pub mod locks;
pub mod patch;

pub use editor::{BufferEditor, EditorController, EditorMode, EditorSession, Submission};
pub use error::{EditorError, GatewayError, GatewayResult};
pub use gateway::{DocumentGateway, OpenedDocument};
pub use locks::DocumentLocks;
pub use patch::{compute_patch, resolve_grants};
