//! Helpers shared by the in-crate test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::net::types::{Paginated, UserRecord};
use crate::net::{ApiClient, FetchError};
use crate::session::{AuthBackend, AuthError};

/// Serve `router` on an ephemeral local port; returns the `/api` base URL.
pub(crate) async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// Base URL of a port that refuses connections.
pub(crate) async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

pub(crate) fn api_client(base_url: &str) -> ApiClient {
    ApiClient::new(ClientConfig::new(base_url)).unwrap()
}

pub(crate) fn shared_api_client(base_url: &str) -> Arc<ApiClient> {
    Arc::new(api_client(base_url))
}

// =============================================================
// MockBackend
// =============================================================

pub(crate) enum Lookup {
    Users(Vec<UserRecord>),
    Fail(u16),
}

/// Scripted [`AuthBackend`] recording the calls it receives.
pub(crate) struct MockBackend {
    token: Result<String, String>,
    lookup: Lookup,
    logout_fails: bool,
    pub(crate) lookup_calls: AtomicUsize,
    pub(crate) logout_tokens: Mutex<Vec<String>>,
}

impl MockBackend {
    pub(crate) fn accepting(token: &str) -> Self {
        Self {
            token: Ok(token.to_owned()),
            lookup: Lookup::Users(Vec::new()),
            logout_fails: false,
            lookup_calls: AtomicUsize::new(0),
            logout_tokens: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn rejecting(message: &str) -> Self {
        Self { token: Err(message.to_owned()), ..Self::accepting("") }
    }

    pub(crate) fn with_users(mut self, users: Vec<UserRecord>) -> Self {
        self.lookup = Lookup::Users(users);
        self
    }

    pub(crate) fn failing_lookup(mut self, status: u16) -> Self {
        self.lookup = Lookup::Fail(status);
        self
    }

    pub(crate) fn failing_logout(mut self) -> Self {
        self.logout_fails = true;
        self
    }

    pub(crate) fn logout_tokens(&self) -> Vec<String> {
        self.logout_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn obtain_token(&self, _username: &str, _password: &str) -> Result<String, AuthError> {
        self.token.clone().map_err(AuthError::Credentials)
    }

    async fn lookup_users(&self, _token: &str, _username: &str) -> Result<Paginated<UserRecord>, FetchError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        match &self.lookup {
            Lookup::Users(users) => Ok(Paginated::single(users.clone())),
            Lookup::Fail(status) => Err(FetchError::Status { status: *status, message: "lookup failed".into() }),
        }
    }

    async fn notify_logout(&self, token: &str) -> Result<(), FetchError> {
        self.logout_tokens.lock().unwrap().push(token.to_owned());
        if self.logout_fails {
            return Err(FetchError::Status { status: 503, message: "Service Unavailable".into() });
        }
        Ok(())
    }
}

pub(crate) fn user_record(id: i64, username: &str, first_name: &str, last_name: &str) -> UserRecord {
    UserRecord {
        id,
        username: username.to_owned(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        role: None,
        is_staff: false,
        groups: Vec::new(),
    }
}
