//! Two-phase credential exchange.
//!
//! DESIGN
//! ======
//! Phase 1 (token) decides whether the credentials are valid. Phase 2
//! (profile lookup) is enrichment: its failure degrades to a placeholder
//! profile instead of failing the flow. The placeholder carries `id = 0`, so
//! the session manager still refuses to treat the result as a login.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use super::backend::AuthBackend;
use super::error::AuthError;
use crate::net::types::{Profile, UserRecord};

/// Token plus resolved profile, before validation by the session manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Profile,
}

pub struct LoginFlow;

impl LoginFlow {
    /// Run both phases against `backend`.
    ///
    /// # Errors
    ///
    /// Returns the phase-1 error unchanged. Phase-2 failures never error here.
    pub async fn run(backend: &dyn AuthBackend, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let token = backend.obtain_token(username, password).await?;
        let user = Self::resolve_profile(backend, &token, username).await;
        Ok(LoginOutcome { token, user })
    }

    async fn resolve_profile(backend: &dyn AuthBackend, token: &str, username: &str) -> Profile {
        match backend.lookup_users(token, username).await {
            Ok(page) => match select_user(page.results, username) {
                Some(record) => record.into_profile(),
                None => {
                    tracing::warn!(%username, "profile lookup returned no users; using placeholder profile");
                    Profile::placeholder(username)
                }
            },
            Err(e) => {
                tracing::warn!(%username, error = %e, "profile lookup failed; using placeholder profile");
                Profile::placeholder(username)
            }
        }
    }
}

/// First exact username match, else the first row.
fn select_user(mut results: Vec<UserRecord>, username: &str) -> Option<UserRecord> {
    match results.iter().position(|r| r.username == username) {
        Some(idx) => Some(results.swap_remove(idx)),
        None => results.into_iter().next(),
    }
}
