//! Client configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: Option<u64>,
    pub connect_secs: Option<u64>,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Option<Duration> {
        self.request_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Config pointing at `base_url` with no timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: normalize_base_url(&base_url.into()), timeouts: Timeouts::default() }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `ITSM_API_BASE_URL`: default `http://localhost:8000/api`
    /// - `ITSM_REQUEST_TIMEOUT_SECS`: no timeout when absent
    /// - `ITSM_CONNECT_TIMEOUT_SECS`: no timeout when absent
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("ITSM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse_secs("ITSM_REQUEST_TIMEOUT_SECS")?,
            connect_secs: env_parse_secs("ITSM_CONNECT_TIMEOUT_SECS")?,
        };
        Ok(Self { base_url: normalize_base_url(&base_url), timeouts })
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_secs(var: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { var, value: raw.clone() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
