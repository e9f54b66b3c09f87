//! Backend calls used by the login and logout flows.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthBackend` is the seam between session policy and HTTP. The session
//! manager and login flow only see the trait; `HttpAuthBackend` is the
//! production implementation over [`ApiClient`].

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{AuthError, DEFAULT_CREDENTIALS_MESSAGE};
use crate::net::error::ErrorBody;
use crate::net::types::{Paginated, TokenRequest, TokenResponse, UserRecord};
use crate::net::{ApiClient, FetchError, RequestOptions};

pub const TOKEN_PATH: &str = "token/";
pub const USERS_PATH: &str = "security-access/users/";
pub const LOGOUT_PATH: &str = "auth/logout/";

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Credentials`] when the backend rejects the
    /// credentials, or [`AuthError::Fetch`] on transport/decode failure.
    async fn obtain_token(&self, username: &str, password: &str) -> Result<String, AuthError>;

    /// List users whose username matches `username`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the request fails.
    async fn lookup_users(&self, token: &str, username: &str) -> Result<Paginated<UserRecord>, FetchError>;

    /// Tell the backend the token is no longer in use.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the request fails.
    async fn notify_logout(&self, token: &str) -> Result<(), FetchError>;
}

/// [`AuthBackend`] over the REST API.
#[derive(Clone, Debug)]
pub struct HttpAuthBackend {
    api: Arc<ApiClient>,
}

impl HttpAuthBackend {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn obtain_token(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let url = self.api.config().url(TOKEN_PATH);
        let response = self
            .api
            .http()
            .post(&url)
            .json(&TokenRequest { username, password })
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::from)?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "token endpoint rejected credentials");
            let message = ErrorBody::parse(&body)
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_MESSAGE.to_owned());
            return Err(AuthError::Credentials(message));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(FetchError::from)?;
        if token.access.trim().is_empty() {
            return Err(AuthError::Credentials("token endpoint returned an empty token".to_owned()));
        }
        Ok(token.access)
    }

    async fn lookup_users(&self, token: &str, username: &str) -> Result<Paginated<UserRecord>, FetchError> {
        let base = self.api.config().url(USERS_PATH);
        let url = reqwest::Url::parse_with_params(&base, &[("username", username)])
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let Some(page) = self
            .api
            .fetch::<Paginated<serde_json::Value>>(url.as_str(), token, RequestOptions::get())
            .await?
        else {
            return Ok(Paginated::empty());
        };
        Ok(Paginated {
            count: page.count,
            next: page.next,
            previous: page.previous,
            results: page.results.into_iter().filter_map(decode_user_row).collect(),
        })
    }

    async fn notify_logout(&self, token: &str) -> Result<(), FetchError> {
        self.api
            .send(LOGOUT_PATH, token, RequestOptions::post(serde_json::json!({})))
            .await?;
        Ok(())
    }
}

/// Unreadable rows are dropped so one malformed user cannot hide the others.
fn decode_user_row(row: serde_json::Value) -> Option<UserRecord> {
    match serde_json::from_value(row) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unreadable user row");
            None
        }
    }
}
