//! Document access evaluation.
//!
//! This crate decides what a requesting user may do with a document. The
//! decision is a pure function of the requester, the document and the
//! document's role grants, so it can be evaluated anywhere a document is
//! read or written.
//!
//! # Modules
//!
//! - `requester`: the verified identity attached to a request
//! - `evaluator`: the access rules and listing filters
//!
//! # Example
//!
//! ```
//! use access::{evaluate, EffectiveAccess, Requester};
//! use dms_model::{AccessLevel, GrantSet, RoleId, UserId};
//!
//! let reader = Requester::new(UserId(2), RoleId(4));
//! let grants = GrantSet::read_for([RoleId(4)]);
//!
//! let access = evaluate(&reader, UserId(1), AccessLevel::Shared, &grants);
//! assert_eq!(access, EffectiveAccess::ReadOnly);
//! ```

pub mod evaluator;
pub mod requester;

pub use evaluator::{evaluate, evaluate_document, evaluate_record, visible_documents, EffectiveAccess};
pub use requester::Requester;
