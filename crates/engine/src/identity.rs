//! Identity provider contract.
//!
//! Identity is explicit: upload and batch-creation operations take an
//! [`Identity`] (or `None` on a first upload, in which case the engine asks
//! the provider for an anonymous session). The HTTP layer supplies the
//! signed-token implementation.

use batchtone_core::error::CoreError;
use batchtone_core::types::{Timestamp, UserId};
use serde::Serialize;

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
}

/// A freshly issued anonymous session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    /// Resolve a session token to its user. Fails with
    /// [`CoreError::Unauthorized`] for an invalid or expired token.
    fn current_user(&self, token: &str) -> Result<Identity, CoreError>;

    /// Mint a new anonymous user and a token for it.
    fn create_anonymous_session(&self) -> Result<Session, CoreError>;
}
