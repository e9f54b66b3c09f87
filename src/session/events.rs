//! "Authentication invalidated" signal.
//!
//! DESIGN
//! ======
//! Low-level request code publishes, the session manager subscribes. Neither
//! side names the other, so fetch stays free of session lifecycle policy.

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    /// The backend rejected the current credential with `status`.
    Invalidated { status: u16 },
}

/// Cloneable publish handle; every clone feeds the same subscribers.
#[derive(Clone, Debug)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Publish `event`. Having no subscriber is not an error.
    pub fn publish(&self, event: AuthEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(?event, "auth event published with no subscribers");
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}
