use crate::net::FetchError;
use crate::storage::StorageError;

/// Message used when the token endpoint rejects credentials without a `detail`.
pub const DEFAULT_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint rejected the credentials.
    #[error("{0}")]
    Credentials(String),
    /// Login produced a profile without a positive id.
    #[error("invalid user ID returned by server")]
    InvalidUserId,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}
