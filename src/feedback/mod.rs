//! Transient notifications and modal confirmation.
//!
//! DESIGN
//! ======
//! One snackbar and one confirm dialog exist at a time. Showing either again
//! replaces the current instance; there is no queue. Dialog callbacks are
//! taken out of the shared state before they run, so a callback can reopen
//! the dialog without deadlocking and a stale callback can never fire twice.


mod provider;

pub use provider::{UiProvider, try_use_ui, use_ui};

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// How long a snackbar stays open without an explicit close.
pub const SNACKBAR_AUTO_HIDE: Duration = Duration::from_secs(6);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

/// Visible snackbar. Closing keeps `message` and `severity` in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnackbarState {
    pub open: bool,
    pub message: String,
    pub severity: Severity,
}

/// Renderable part of the confirm dialog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmView {
    pub open: bool,
    pub title: String,
    pub message: String,
}

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ConfirmDialog {
    view: ConfirmView,
    on_confirm: Option<Callback>,
    on_cancel: Option<Callback>,
}

#[derive(Default)]
struct Inner {
    snackbar: SnackbarState,
    /// Bumped on every `show_snackbar`; auto-hide timers only close their own generation.
    snackbar_generation: u64,
    confirm: ConfirmDialog,
}

/// Cloneable handle to the feedback state; every clone shares it.
#[derive(Clone, Default)]
pub struct UiFeedback {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for UiFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("UiFeedback")
            .field("snackbar", &inner.snackbar)
            .field("confirm", &inner.confirm.view)
            .finish()
    }
}

impl UiFeedback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // SNACKBAR
    // =========================================================================

    #[must_use]
    pub fn snackbar(&self) -> SnackbarState {
        self.lock().snackbar.clone()
    }

    /// Replace the current snackbar and schedule its auto-hide.
    ///
    /// Without a tokio runtime the snackbar stays open until `close_snackbar`.
    pub fn show_snackbar(&self, message: impl Into<String>, severity: Severity) {
        let generation = {
            let mut inner = self.lock();
            inner.snackbar = SnackbarState { open: true, message: message.into(), severity };
            inner.snackbar_generation += 1;
            inner.snackbar_generation
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(SNACKBAR_AUTO_HIDE).await;
            hide_if_current(&weak, generation);
        });
    }

    pub fn show_error(&self, message: impl Into<String>) {
        self.show_snackbar(message, Severity::Error);
    }

    pub fn show_success(&self, message: impl Into<String>) {
        self.show_snackbar(message, Severity::Success);
    }

    pub fn show_info(&self, message: impl Into<String>) {
        self.show_snackbar(message, Severity::Info);
    }

    pub fn show_warning(&self, message: impl Into<String>) {
        self.show_snackbar(message, Severity::Warning);
    }

    pub fn close_snackbar(&self) {
        self.lock().snackbar.open = false;
    }

    // =========================================================================
    // CONFIRM DIALOG
    // =========================================================================

    #[must_use]
    pub fn confirm_dialog(&self) -> ConfirmView {
        self.lock().confirm.view.clone()
    }

    /// Open the dialog with a confirm action and no cancel action.
    pub fn show_confirm_dialog<C>(&self, title: impl Into<String>, message: impl Into<String>, on_confirm: C)
    where
        C: FnOnce() + Send + 'static,
    {
        self.open_dialog(title.into(), message.into(), Box::new(on_confirm), None);
    }

    /// Open the dialog with both a confirm and a cancel action.
    pub fn show_confirm_dialog_with_cancel<C, X>(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        on_confirm: C,
        on_cancel: X,
    ) where
        C: FnOnce() + Send + 'static,
        X: FnOnce() + Send + 'static,
    {
        self.open_dialog(title.into(), message.into(), Box::new(on_confirm), Some(Box::new(on_cancel)));
    }

    fn open_dialog(&self, title: String, message: String, on_confirm: Callback, on_cancel: Option<Callback>) {
        let mut inner = self.lock();
        if inner.confirm.view.open {
            tracing::debug!(previous = %inner.confirm.view.title, "replacing open confirm dialog");
        }
        inner.confirm = ConfirmDialog {
            view: ConfirmView { open: true, title, message },
            on_confirm: Some(on_confirm),
            on_cancel,
        };
    }

    /// Fire the confirm action. Returns `false` if no dialog was open.
    pub fn confirm(&self) -> bool {
        let Some(dialog) = self.take_dialog() else {
            return false;
        };
        if let Some(on_confirm) = dialog.on_confirm {
            on_confirm();
        }
        true
    }

    /// Fire the cancel action, if any. Returns `false` if no dialog was open.
    pub fn cancel(&self) -> bool {
        let Some(dialog) = self.take_dialog() else {
            return false;
        };
        if let Some(on_cancel) = dialog.on_cancel {
            on_cancel();
        }
        true
    }

    /// Backdrop click or escape: same as [`UiFeedback::cancel`].
    pub fn dismiss(&self) -> bool {
        self.cancel()
    }

    /// Close and reset the dialog, handing back what it held.
    fn take_dialog(&self) -> Option<ConfirmDialog> {
        let mut inner = self.lock();
        if !inner.confirm.view.open {
            return None;
        }
        Some(std::mem::take(&mut inner.confirm))
    }
}

fn hide_if_current(weak: &Weak<Mutex<Inner>>, generation: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
    if inner.snackbar_generation == generation {
        inner.snackbar.open = false;
    }
}
