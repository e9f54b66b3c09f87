//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by route guards and identity-aware feature code. Only the session
//! manager constructs new values; everyone else sees whole snapshots.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use crate::net::types::Profile;

/// Lifecycle position of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, hydration not yet started.
    #[default]
    Uninitialized,
    /// Reading the persisted session.
    Hydrating,
    Unauthenticated,
    Authenticated,
    /// A `login` call is in flight.
    LoggingIn,
}

/// Snapshot of the process-wide session.
///
/// `token` and `user` are always replaced together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<Profile>,
    pub loading: bool,
    pub phase: SessionPhase,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

impl AuthState {
    /// State before hydration: nothing known yet, so `loading` is set.
    #[must_use]
    pub fn initial() -> Self {
        Self { token: None, user: None, loading: true, phase: SessionPhase::Uninitialized }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { token: None, user: None, loading: false, phase: SessionPhase::Unauthenticated }
    }

    #[must_use]
    pub fn authenticated(token: String, user: Profile) -> Self {
        Self { token: Some(token), user: Some(user), loading: false, phase: SessionPhase::Authenticated }
    }

    /// True iff a token and a user with a positive id are both present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.as_ref().is_some_and(Profile::has_valid_id)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}
