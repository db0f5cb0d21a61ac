//! Identity for Shift DMS.
//!
//! Turns bearer tokens into the verified `Requester` the access evaluator
//! trusts, and tracks a client's login state.
//!
//! - `token`: signing and verifying session tokens
//! - `provider`: async identity providers
//! - `session`: login/signup/logout state machine

pub mod error;
pub mod provider;
pub mod session;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use provider::{IdentityProvider, StaticIdentityProvider, TokenIdentityProvider};
pub use session::{AuthenticatedUser, PendingAction, SessionState, UserSession};
pub use token::{Claims, Subject, TokenIssuer, DEFAULT_TOKEN_TTL_DAYS};
