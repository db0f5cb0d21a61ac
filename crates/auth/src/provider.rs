//! Identity providers.
//!
//! Providers authenticate a bearer token into the `Requester` the rest of
//! the system trusts.

use access::Requester;
use dms_model::RoleRegistry;
use std::collections::HashMap;

use crate::error::{AuthError, AuthResult};
use crate::token::TokenIssuer;

/// Identity provider trait.
///
/// Implement this trait to plug in another source of identities.
#[trait_variant::make(Send)]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate a client with the given token.
    async fn authenticate(&self, token: &str) -> AuthResult<Requester>;
}

/// Provider backed by signed session tokens.
#[derive(Debug, Clone)]
pub struct TokenIdentityProvider {
    issuer: TokenIssuer,
    roles: RoleRegistry,
}

impl TokenIdentityProvider {
    pub fn new(issuer: TokenIssuer, roles: RoleRegistry) -> Self {
        Self { issuer, roles }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

impl IdentityProvider for TokenIdentityProvider {
    async fn authenticate(&self, token: &str) -> AuthResult<Requester> {
        let claims = self.issuer.verify(token).inspect_err(|e| {
            tracing::warn!("Rejected token: {}", e);
        })?;
        let subject = claims.subject()?;

        if !self.roles.contains(subject.role_id) {
            tracing::warn!(
                "Token for user {} names unknown role {}",
                subject.user_id,
                subject.role_id
            );
        }

        // Role titles in the token may be stale; the registry decides.
        let privileged = self.roles.is_privileged(subject.role_id);
        Ok(Requester {
            user_id: subject.user_id,
            role_id: subject.role_id,
            privileged,
        })
    }
}

/// Simple in-memory provider for testing.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityProvider {
    users: HashMap<String, Requester>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user reachable through `token`
    pub fn add_user(&mut self, token: impl Into<String>, requester: Requester) {
        self.users.insert(token.into(), requester);
    }
}

impl IdentityProvider for StaticIdentityProvider {
    async fn authenticate(&self, token: &str) -> AuthResult<Requester> {
        self.users
            .get(token)
            .copied()
            .ok_or_else(|| AuthError::InvalidToken("Unknown token".to_string()))
    }
}
