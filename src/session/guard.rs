//! Protected-route gate.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view applies the same rule: wait while the session is
//! loading, redirect to the login route once it has settled without an
//! authenticated user, render otherwise.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use tokio::sync::watch;

use super::state::AuthState;

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Hydration or login still in flight; render nothing yet.
    Pending,
    RedirectToLogin,
    Allow,
}

#[must_use]
pub fn route_decision(state: &AuthState) -> RouteDecision {
    if state.loading {
        RouteDecision::Pending
    } else if state.is_authenticated() {
        RouteDecision::Allow
    } else {
        RouteDecision::RedirectToLogin
    }
}

/// Wait until the session settles, then decide.
///
/// A closed channel means the session owner is gone, which never allows access.
pub async fn settled_decision(rx: &mut watch::Receiver<AuthState>) -> RouteDecision {
    match rx.wait_for(|s| !s.loading).await {
        Ok(state) => route_decision(&state),
        Err(_) => RouteDecision::RedirectToLogin,
    }
}
