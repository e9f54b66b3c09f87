//! Durable key-value storage for the persisted session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session manager is the only writer. It stores the bearer token and the
//! serialized profile under two independent keys and treats their co-presence
//! as a precondition on read, since nothing here makes the pair transactional.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key holding the raw bearer token.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Storage key holding the JSON-serialized profile.
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value store surviving process restarts (where the backend allows).
///
/// A missing key reads as `Ok(None)`. Any other failure is reported as an error
/// and left to the caller to classify.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
