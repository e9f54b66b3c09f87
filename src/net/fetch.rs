//! Authenticated JSON fetch over `reqwest`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every backend call made on behalf of a signed-in user goes through
//! [`ApiClient::fetch`]. It performs exactly one request: no retry, no token
//! refresh, no queueing. Session policy (logout on 401/403) lives with the
//! caller, see `net::authed`.

#[cfg(test)]
#[path = "fetch_test.rs"]
mod fetch_test;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use super::error::{FetchError, status_error};
use super::types::{PageQuery, Paginated};
use crate::config::ClientConfig;

/// Request body variants. JSON bodies are serialized without touching headers,
/// so a caller-supplied `Content-Type` always survives.
#[derive(Clone, Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// Per-call options merged over the default headers.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers; these overwrite defaults with the same name.
    pub headers: Vec<(String, String)>,
    /// Header names removed after merging (e.g. `content-type` for multipart).
    pub omit_headers: Vec<String>,
    pub body: Option<RequestBody>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { method: Method::GET, headers: Vec::new(), omit_headers: Vec::new(), body: None }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn delete() -> Self {
        Self { method: Method::DELETE, ..Self::default() }
    }

    #[must_use]
    pub fn post(body: serde_json::Value) -> Self {
        Self::with_json(Method::POST, body)
    }

    #[must_use]
    pub fn put(body: serde_json::Value) -> Self {
        Self::with_json(Method::PUT, body)
    }

    #[must_use]
    pub fn patch(body: serde_json::Value) -> Self {
        Self::with_json(Method::PATCH, body)
    }

    fn with_json(method: Method, body: serde_json::Value) -> Self {
        Self { method, body: Some(RequestBody::Json(body)), ..Self::default() }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.omit_headers.push(name.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Merge defaults, caller headers and caller omissions, in that order.
///
/// # Errors
///
/// Returns [`FetchError::InvalidHeader`] for names or values that are not valid HTTP.
pub fn merge_headers(token: &str, opts: &RequestOptions) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut bearer =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| FetchError::InvalidHeader(e.to_string()))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    for (name, value) in &opts.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader(e.to_string()))?;
        headers.insert(name, value);
    }
    for name in &opts.omit_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader(e.to_string()))?;
        headers.remove(name);
    }
    Ok(headers)
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client honouring the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeouts.request() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.timeouts.connect() {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self { http: builder.build()?, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issue one authenticated request and decode the JSON response.
    ///
    /// `url` is either absolute or a path under the configured base URL.
    /// Resolves to `Ok(None)` on 204 and `Ok(Some(body))` on any other 2xx.
    ///
    /// # Errors
    ///
    /// - [`FetchError::MissingToken`] if `token` is blank (no request is made)
    /// - [`FetchError::Status`] on non-2xx, carrying `detail`, `message` or the status text
    /// - [`FetchError::Network`] if the request itself fails
    /// - [`FetchError::Decode`] if a 2xx body is not the expected JSON
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        opts: RequestOptions,
    ) -> Result<Option<T>, FetchError> {
        let response = self.execute(url, token, opts).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Issue one authenticated request whose success body is irrelevant.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::fetch`], minus decode failures.
    pub async fn send(&self, url: &str, token: &str, opts: RequestOptions) -> Result<StatusCode, FetchError> {
        let response = self.execute(url, token, opts).await?;
        Ok(response.status())
    }

    async fn execute(&self, url: &str, token: &str, opts: RequestOptions) -> Result<reqwest::Response, FetchError> {
        if token.trim().is_empty() {
            return Err(FetchError::MissingToken);
        }
        let headers = merge_headers(token, &opts)?;
        let url = self.config.url(url);

        let mut request = self
            .http
            .request(opts.method.clone(), &url)
            .headers(headers);
        request = match opts.body {
            Some(RequestBody::Json(value)) => request.body(serde_json::to_vec(&value)?),
            Some(RequestBody::Text(text)) => request.body(text),
            Some(RequestBody::Bytes(bytes)) => request.body(bytes),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(method = %opts.method, %url, status = status.as_u16(), "api request");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(response)
    }

    /// GET one page of a paginated list endpoint.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::fetch`].
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        page: PageQuery,
    ) -> Result<Paginated<T>, FetchError> {
        let page = self
            .fetch::<Paginated<T>>(&page.apply(path), token, RequestOptions::get())
            .await?;
        Ok(page.unwrap_or_else(Paginated::empty))
    }
}
