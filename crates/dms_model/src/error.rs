//! Error types for model conversions

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown access level code: {0}")]
    InvalidAccessLevel(u8),

    #[error("Unknown access level name: {0}")]
    UnknownAccessLevel(String),

    #[error("Unknown grant right code: {0}")]
    InvalidGrantRight(u8),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
