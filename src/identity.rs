//! Identity Collaborator
//!
//! The engine never issues or manages identity — an external provider
//! owns it. The one operation consumed here is "who is the caller",
//! used to authorize move submissions.

use std::sync::Mutex;

use crate::game::session::PlayerId;

/// Source of the caller's identity.
pub trait IdentityProvider: Send + Sync {
    /// The authenticated player behind the current client, if any.
    fn current_user(&self) -> Option<PlayerId>;
}

/// Provider that trusts the caller-supplied player id.
///
/// For deployments where the collaborator in front of the engine has
/// already authenticated the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustedCaller;

impl IdentityProvider for TrustedCaller {
    fn current_user(&self) -> Option<PlayerId> {
        None
    }
}

/// Fixed identity for tests and the demo binary.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    user: Mutex<Option<PlayerId>>,
}

impl StaticIdentity {
    /// Provider with no signed-in user.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Provider signed in as `player`.
    pub fn signed_in(player: PlayerId) -> Self {
        Self {
            user: Mutex::new(Some(player)),
        }
    }

    /// Switch the signed-in user.
    pub fn sign_in(&self, player: PlayerId) {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = Some(player);
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<PlayerId> {
        *self.user.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// TESTS
// =============================================================================
