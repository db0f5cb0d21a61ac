//! HS256 session tokens.
//!
//! Claims carry the user id in `sub` together with the role id and title the
//! user held when the token was issued.

use chrono::{DateTime, Duration, Utc};
use dms_model::{RoleId, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Token lifetime unless configured otherwise
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 14;

/// Who a token was issued to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub role_title: String,
}

/// Signed token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role_id: RoleId,
    pub role: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Decode the subject out of the claims
    pub fn subject(&self) -> AuthResult<Subject> {
        let user_id = self
            .sub
            .parse::<UserId>()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(Subject {
            user_id,
            role_id: self.role_id,
            role_title: self.role.clone(),
        })
    }
}

/// Signs and verifies tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer with the default lifetime
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token valid from now
    pub fn issue(&self, subject: &Subject) -> AuthResult<String> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if signed at `issued_at`
    pub fn issue_at(&self, subject: &Subject, issued_at: DateTime<Utc>) -> AuthResult<String> {
        let claims = Claims {
            sub: subject.user_id.to_string(),
            role_id: subject.role_id,
            role: subject.role_title.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;
        tracing::debug!("Issued token for user {} (role {})", subject.user_id, subject.role_id);
        Ok(token)
    }

    /// Verify signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
