//! Client login state.
//!
//! A `UserSession` is a plain value; transitions consume it and return the
//! next state. The last failure message is kept until the next request.

use access::Requester;
use dms_model::{RoleRegistry, User};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// A request in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    Login,
    Signup,
    Logout,
}

impl PendingAction {
    pub fn name(&self) -> &'static str {
        match self {
            PendingAction::Login => "log in",
            PendingAction::Signup => "sign up",
            PendingAction::Logout => "log out",
        }
    }
}

/// A logged-in user and their token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Anonymous,
    Pending {
        action: PendingAction,
        /// Who was logged in when the request started
        current: Option<AuthenticatedUser>,
    },
    Authenticated(AuthenticatedUser),
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Pending { .. } => "a request is pending",
            SessionState::Authenticated(_) => "authenticated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    state: SessionState,
    error: Option<String>,
}

impl Default for UserSession {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl UserSession {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Message of the last failed request
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// The requester for document operations, if logged in
    pub fn requester(&self, roles: &RoleRegistry) -> Option<Requester> {
        self.user().map(|auth| Requester {
            user_id: auth.user.id,
            role_id: auth.user.role_id,
            privileged: roles.is_privileged(auth.user.role_id),
        })
    }

    /// Start a login, signup or logout request.
    ///
    /// Login and signup start from anonymous; logout needs a logged-in user.
    pub fn begin(self, action: PendingAction) -> AuthResult<Self> {
        let current = match (action, self.state) {
            (PendingAction::Login | PendingAction::Signup, SessionState::Anonymous) => None,
            (PendingAction::Logout, SessionState::Authenticated(user)) => Some(user),
            (_, state) => {
                return Err(AuthError::InvalidTransition {
                    action: action.name(),
                    state: state.name(),
                })
            }
        };

        Ok(Self {
            state: SessionState::Pending { action, current },
            error: None,
        })
    }

    /// Complete a pending login or signup
    pub fn authenticated(self, user: AuthenticatedUser) -> AuthResult<Self> {
        match self.state {
            SessionState::Pending {
                action: PendingAction::Login | PendingAction::Signup,
                ..
            } => {
                tracing::info!("User {} logged in", user.user.id);
                Ok(Self {
                    state: SessionState::Authenticated(user),
                    error: None,
                })
            }
            state => Err(AuthError::InvalidTransition {
                action: "complete a login",
                state: state.name(),
            }),
        }
    }

    /// Complete a pending logout
    pub fn logged_out(self) -> AuthResult<Self> {
        match self.state {
            SessionState::Pending {
                action: PendingAction::Logout,
                ..
            } => Ok(Self::anonymous()),
            state => Err(AuthError::InvalidTransition {
                action: "complete a logout",
                state: state.name(),
            }),
        }
    }

    /// Record a failed request.
    ///
    /// A failed logout keeps the user logged in.
    pub fn failed(self, message: impl Into<String>) -> AuthResult<Self> {
        let message = message.into();
        match self.state {
            SessionState::Pending { action, current } => {
                tracing::warn!("Failed to {}: {}", action.name(), message);
                let state = match current {
                    Some(user) => SessionState::Authenticated(user),
                    None => SessionState::Anonymous,
                };
                Ok(Self {
                    state,
                    error: Some(message),
                })
            }
            state => Err(AuthError::InvalidTransition {
                action: "record a failure",
                state: state.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms_model::{RoleId, UserId};

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            user: User {
                id: UserId(2),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                role_id: RoleId(4),
            },
            token: "token".to_string(),
        }
    }

    fn logged_in() -> UserSession {
        UserSession::anonymous()
            .begin(PendingAction::Login)
            .unwrap()
            .authenticated(alice())
            .unwrap()
    }

    #[test]
    fn test_login_flow() {
        let session = logged_in();
        assert!(session.is_authenticated());
        assert_eq!(
            session.requester(&RoleRegistry::default()),
            Some(Requester::new(UserId(2), RoleId(4)))
        );
    }

    #[test]
    fn test_failed_signup_returns_to_anonymous_with_message() {
        let session = UserSession::anonymous()
            .begin(PendingAction::Signup)
            .unwrap()
            .failed("Email already taken")
            .unwrap();

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.error(), Some("Email already taken"));
    }

    #[test]
    fn test_new_request_clears_error() {
        let session = UserSession::anonymous()
            .begin(PendingAction::Login)
            .unwrap()
            .failed("Wrong password")
            .unwrap()
            .begin(PendingAction::Login)
            .unwrap();

        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_logout_flow() {
        let session = logged_in()
            .begin(PendingAction::Logout)
            .unwrap()
            .logged_out()
            .unwrap();

        assert_eq!(session, UserSession::anonymous());
    }

    #[test]
    fn test_failed_logout_keeps_user() {
        let session = logged_in()
            .begin(PendingAction::Logout)
            .unwrap()
            .failed("Network down")
            .unwrap();

        assert_eq!(session.user(), Some(&alice()));
        assert_eq!(session.error(), Some("Network down"));
    }

    #[test]
    fn test_invalid_transitions() {
        assert_eq!(
            UserSession::anonymous().begin(PendingAction::Logout),
            Err(AuthError::InvalidTransition {
                action: "log out",
                state: "anonymous",
            })
        );
        assert!(logged_in().begin(PendingAction::Login).is_err());
        assert!(UserSession::anonymous().authenticated(alice()).is_err());
        assert!(logged_in().failed("x").is_err());
    }

    #[test]
    fn test_privileged_requester() {
        let mut user = alice();
        user.user.role_id = RoleId(1);
        let session = UserSession::anonymous()
            .begin(PendingAction::Login)
            .unwrap()
            .authenticated(user)
            .unwrap();

        let requester = session.requester(&RoleRegistry::default()).unwrap();
        assert!(requester.privileged);
    }
}
