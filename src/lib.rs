//! # itsm-client
//!
//! Session and request core of the ITSM desk front-end.
//!
//! This crate owns the signed-in session (persisted token and profile, login,
//! logout, invalidation on rejected credentials), the bearer-token fetch
//! wrapper every feature module uses, and the snackbar / confirm-dialog
//! feedback primitives. Rendering, routing tables and per-entity CRUD screens
//! live with the consumers of this crate.

pub mod config;
pub mod feedback;
pub mod net;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use config::{ClientConfig, ConfigError};
pub use feedback::{Severity, UiFeedback, UiProvider, use_ui};
pub use net::{ApiClient, AuthedClient, FetchError, RequestOptions};
pub use session::{AuthError, AuthState, HttpAuthBackend, SessionManager};
pub use storage::{FileStore, MemoryStore, SessionStore};
