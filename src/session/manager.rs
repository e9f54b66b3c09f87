//! Owner of the process-wide session.
//!
//! ARCHITECTURE
//! ============
//! `SessionManager` is the only writer of both the in-memory session and the
//! persisted store. Everything else reads snapshots through `subscribe()` and
//! changes the session only through `login` / `logout`.
//!
//! ```text
//!   Uninitialized -> Hydrating -> { Unauthenticated | Authenticated }
//!                                        |  login()  ^
//!                                        v           |
//!                                    LoggingIn ------+--> Unauthenticated
//! ```
//!
//! TRADE-OFFS
//! ==========
//! Hydration trusts the persisted token without a server round-trip. A stale
//! token surfaces on first use as a 401/403, which the invalidation listener
//! turns into a logout. Overlapping `login` calls are not coalesced; the last
//! one to finish decides the final state.

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::backend::AuthBackend;
use super::error::AuthError;
use super::events::{AuthEvent, AuthEvents};
use super::login::LoginFlow;
use super::state::{AuthState, SessionPhase};
use crate::net::types::Profile;
use crate::net::{ApiClient, AuthedClient, FetchError};
use crate::storage::{AUTH_TOKEN_KEY, SessionStore, StorageError, USER_KEY};

/// Why a persisted session was discarded during hydration.
#[derive(Debug, thiserror::Error)]
enum CorruptSession {
    #[error("store unreadable: {0}")]
    Storage(#[from] StorageError),
    #[error("user is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("user has invalid id {0}")]
    InvalidId(i64),
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    state: watch::Sender<AuthState>,
    events: AuthEvents,
    hydrated: AtomicBool,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        Self { store, backend, state, events: AuthEvents::new(), hydrated: AtomicBool::new(false) }
    }

    // =========================================================================
    // READ SURFACE
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<Profile> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Request client bound to this session's token and invalidation channel.
    #[must_use]
    pub fn authed_client(&self, api: Arc<ApiClient>) -> AuthedClient {
        AuthedClient::new(api, self.subscribe(), self.events.clone())
    }

    // =========================================================================
    // HYDRATION
    // =========================================================================

    /// Restore the session from the persisted store. Runs once; later calls
    /// return the current snapshot unchanged.
    ///
    /// Corrupt data (unreadable store, malformed user JSON, missing or
    /// non-positive id) is logged and discarded, never surfaced as an error.
    pub fn hydrate(&self) -> AuthState {
        if self.hydrated.swap(true, Ordering::SeqCst) {
            return self.snapshot();
        }
        self.state.send_modify(|s| {
            s.phase = SessionPhase::Hydrating;
            s.loading = true;
        });

        let next = match self.read_persisted() {
            Ok(Some((token, user))) => {
                tracing::info!(user_id = user.id, "session restored from store");
                AuthState::authenticated(token, user)
            }
            Ok(None) => {
                tracing::debug!("no persisted session");
                AuthState::unauthenticated()
            }
            Err(reason) => {
                tracing::warn!(%reason, "discarding corrupt persisted session");
                self.clear_persisted();
                AuthState::unauthenticated()
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    fn read_persisted(&self) -> Result<Option<(String, Profile)>, CorruptSession> {
        let token = self.store.get(AUTH_TOKEN_KEY)?.filter(|t| !t.is_empty());
        let raw_user = self.store.get(USER_KEY)?.filter(|u| !u.is_empty());
        let (Some(token), Some(raw_user)) = (token, raw_user) else {
            return Ok(None);
        };
        let user: Profile = serde_json::from_str(&raw_user)?;
        if !user.has_valid_id() {
            return Err(CorruptSession::InvalidId(user.id));
        }
        Ok(Some((token, user)))
    }

    // =========================================================================
    // LOGIN / LOGOUT
    // =========================================================================

    /// Exchange credentials, resolve the profile and persist the new session.
    ///
    /// Returns `Ok(true)` once the session is authenticated. On any failure
    /// the session and the store are cleared and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Credentials`] if the token endpoint rejects the credentials
    /// - [`AuthError::InvalidUserId`] if the resolved profile has no positive id
    /// - [`AuthError::Fetch`] / [`AuthError::Storage`] on transport or store failure
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        self.state.send_modify(|s| {
            s.phase = SessionPhase::LoggingIn;
            s.loading = true;
        });
        let mut guard = LoadingGuard { state: &self.state, armed: true };

        let result = self.try_login(username, password).await;
        guard.armed = false;
        match result {
            Ok(next) => {
                tracing::info!(user_id = next.user_id(), "login succeeded");
                self.state.send_replace(next);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(%username, error = %e, "login failed");
                self.clear_persisted();
                self.state.send_replace(AuthState::unauthenticated());
                Err(e)
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<AuthState, AuthError> {
        let outcome = LoginFlow::run(self.backend.as_ref(), username, password).await?;
        if !outcome.user.has_valid_id() {
            return Err(AuthError::InvalidUserId);
        }
        let raw_user = serde_json::to_string(&outcome.user).map_err(StorageError::from)?;
        self.store.set(AUTH_TOKEN_KEY, &outcome.token)?;
        self.store.set(USER_KEY, &raw_user)?;
        Ok(AuthState::authenticated(outcome.token, outcome.user))
    }

    /// Clear the session locally, then notify the backend best-effort.
    ///
    /// The local clear is synchronous and unconditional. When a token was
    /// present and a tokio runtime is available, the backend notification
    /// runs as a detached task; its failure is logged and nothing else. The
    /// returned handle may be awaited or dropped.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let previous = self.state.send_replace(AuthState::unauthenticated());
        self.clear_persisted();
        tracing::info!(user_id = previous.user_id(), "session cleared");

        let token = previous.token?;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime; skipping backend logout notification");
            return None;
        };
        let backend = Arc::clone(&self.backend);
        Some(runtime.spawn(async move {
            match backend.notify_logout(&token).await {
                Ok(()) => tracing::debug!("backend acknowledged logout"),
                Err(e) => tracing::warn!(error = %e, "backend logout notification failed"),
            }
        }))
    }

    fn clear_persisted(&self) {
        for key in [AUTH_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(%key, error = %e, "failed to remove persisted session key");
            }
        }
    }

    // =========================================================================
    // INVALIDATION
    // =========================================================================

    /// Log out if `err` is an authorization failure. Returns whether it was.
    pub fn handle_fetch_error(&self, err: &FetchError) -> bool {
        if !err.is_auth_failure() {
            return false;
        }
        tracing::warn!(status = err.status(), "credential rejected by backend; logging out");
        drop(self.logout());
        true
    }

    /// Log out whenever an [`AuthEvent::Invalidated`] is published.
    ///
    /// The task holds only a weak reference and ends when the manager is dropped.
    #[must_use]
    pub fn spawn_invalidation_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.events.subscribe();
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let status = match rx.recv().await {
                    Ok(AuthEvent::Invalidated { status }) => Some(status),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "auth event listener lagged");
                        None
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if manager.token().is_some() {
                    tracing::warn!(?status, "credential rejected by backend; logging out");
                    drop(manager.logout());
                }
            }
        })
    }
}

/// Resets `loading` if a `login` future is dropped before it settles.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<AuthState>,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.state.send_modify(|s| {
            s.loading = false;
            s.phase = if s.is_authenticated() { SessionPhase::Authenticated } else { SessionPhase::Unauthenticated };
        });
    }
}
