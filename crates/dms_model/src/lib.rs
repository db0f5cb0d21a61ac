//! Document model for Shift DMS
//!
//! This crate provides the shared vocabulary of the document management
//! system: identifiers, roles, access levels, documents and the role grants
//! attached to shared documents.

mod access_level;
mod document;
mod error;
mod grant;
mod ids;
mod role;

pub use access_level::*;
pub use document::*;
pub use error::*;
pub use grant::*;
pub use ids::*;
pub use role::*;
