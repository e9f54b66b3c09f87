//! Authentication session lifecycle.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionManager` owns the session. `LoginFlow` and `AuthBackend` implement
//! the credential exchange it drives, `guard` turns snapshots into routing
//! decisions, and `events` carries "credential rejected" signals from request
//! code back to the manager.

pub mod backend;
pub mod error;
pub mod events;
pub mod guard;
pub mod login;
pub mod manager;
pub mod state;

pub use backend::{AuthBackend, HttpAuthBackend};
pub use error::AuthError;
pub use events::{AuthEvent, AuthEvents};
pub use guard::{RouteDecision, route_decision};
pub use login::{LoginFlow, LoginOutcome};
pub use manager::SessionManager;
pub use state::{AuthState, SessionPhase};
