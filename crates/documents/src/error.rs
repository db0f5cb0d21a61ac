//! Error types for document operations.

use dms_model::DocumentId;
use doc_store::StorageError;
use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by the document gateway.
///
/// Validation and permission errors are raised before any storage call, so
/// they never leave partial writes behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Malformed or missing fields.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requester may not perform the operation.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The document does not exist.
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    /// Persistence failure, returned as-is.
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DocumentNotFound(id) => GatewayError::NotFound(id),
            other => GatewayError::Storage(other),
        }
    }
}

/// Errors from invalid editor session transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Cannot {action} while in {mode} mode")]
    InvalidTransition {
        action: &'static str,
        mode: &'static str,
    },

    #[error("Document is read-only for this user")]
    ReadOnly,

    #[error("Access controls are locked for this user")]
    AccessControlsLocked,
}
