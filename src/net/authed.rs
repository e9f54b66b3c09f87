//! Session-bound request client for feature code.
//!
//! DESIGN
//! ======
//! Feature modules never handle tokens. `AuthedClient` reads the current
//! token from the session on every call and, when the backend rejects it,
//! publishes `AuthEvent::Invalidated` before handing the error back. What to do
//! about the rejection is the session manager's decision, not this module's.

#[cfg(test)]
#[path = "authed_test.rs"]
mod authed_test;

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use super::error::FetchError;
use super::fetch::{ApiClient, RequestOptions};
use super::types::{PageQuery, Paginated};
use crate::session::{AuthEvent, AuthEvents, AuthState};

#[derive(Clone, Debug)]
pub struct AuthedClient {
    api: Arc<ApiClient>,
    session: watch::Receiver<AuthState>,
    events: AuthEvents,
}

impl AuthedClient {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, session: watch::Receiver<AuthState>, events: AuthEvents) -> Self {
        Self { api, session, events }
    }

    /// [`ApiClient::fetch`] with the session token.
    ///
    /// # Errors
    ///
    /// [`FetchError::MissingToken`] when signed out, otherwise as [`ApiClient::fetch`].
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str, opts: RequestOptions) -> Result<Option<T>, FetchError> {
        let token = self.token()?;
        let result = self.api.fetch(url, &token, opts).await;
        self.observe(result)
    }

    /// GET and decode, treating 204 as `None`.
    ///
    /// # Errors
    ///
    /// Same as [`AuthedClient::fetch`].
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, FetchError> {
        self.fetch(url, RequestOptions::get()).await
    }

    /// [`ApiClient::send`] with the session token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthedClient::fetch`], minus decode failures.
    pub async fn send(&self, url: &str, opts: RequestOptions) -> Result<StatusCode, FetchError> {
        let token = self.token()?;
        let result = self.api.send(url, &token, opts).await;
        self.observe(result)
    }

    /// [`ApiClient::fetch_page`] with the session token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthedClient::fetch`].
    pub async fn fetch_page<T: DeserializeOwned>(&self, path: &str, page: PageQuery) -> Result<Paginated<T>, FetchError> {
        let token = self.token()?;
        let result = self.api.fetch_page(path, &token, page).await;
        self.observe(result)
    }

    fn token(&self) -> Result<String, FetchError> {
        self.session.borrow().token.clone().ok_or(FetchError::MissingToken)
    }

    fn observe<T>(&self, result: Result<T, FetchError>) -> Result<T, FetchError> {
        if let Err(e) = &result {
            if let Some(status) = e.status().filter(|_| e.is_auth_failure()) {
                tracing::debug!(status, "request rejected credential");
                self.events.publish(AuthEvent::Invalidated { status });
            }
        }
        result
    }
}
