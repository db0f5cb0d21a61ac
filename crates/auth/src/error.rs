//! Error types for identity operations.

use thiserror::Error;

/// Result type alias for identity operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised while issuing or checking identities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed, tampered or unknown token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token's lifetime is over.
    #[error("Token has expired")]
    Expired,

    /// The token could not be signed.
    #[error("Token encoding failed: {0}")]
    Encoding(String),

    /// A session transition that does not apply to the current state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    #[test]
    fn test_expired_signature_maps_to_expired() {
        let err: AuthError = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature).into();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn test_other_errors_map_to_invalid_token() {
        let err: AuthError = jsonwebtoken::errors::Error::from(ErrorKind::InvalidSignature).into();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
