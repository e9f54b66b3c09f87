//! Ambient access to the feedback handle.
//!
//! Synchronous code installs a handle for the current thread with
//! [`UiProvider::scope`]; async code carries one across `.await` points with
//! [`UiProvider::scope_async`]. Scopes nest, innermost wins.

#[cfg(test)]
#[path = "provider_test.rs"]
mod provider_test;

use std::cell::RefCell;

use super::UiFeedback;

thread_local! {
    static THREAD_UI: RefCell<Vec<UiFeedback>> = const { RefCell::new(Vec::new()) };
}

tokio::task_local! {
    static TASK_UI: UiFeedback;
}

pub struct UiProvider;

impl UiProvider {
    /// Run `f` with `ui` installed for the current thread.
    pub fn scope<R>(ui: &UiFeedback, f: impl FnOnce() -> R) -> R {
        THREAD_UI.with(|stack| stack.borrow_mut().push(ui.clone()));
        let _pop = PopOnDrop;
        f()
    }

    /// Run `fut` with `ui` installed for the task polling it.
    pub async fn scope_async<F: Future>(ui: &UiFeedback, fut: F) -> F::Output {
        TASK_UI.scope(ui.clone(), fut).await
    }
}

/// Removes the innermost thread scope, also when `f` unwinds.
struct PopOnDrop;

impl Drop for PopOnDrop {
    fn drop(&mut self) {
        THREAD_UI.with(|stack| stack.borrow_mut().pop());
    }
}

/// Feedback handle of the innermost enclosing scope, if any.
#[must_use]
pub fn try_use_ui() -> Option<UiFeedback> {
    if let Ok(ui) = TASK_UI.try_with(UiFeedback::clone) {
        return Some(ui);
    }
    THREAD_UI.with(|stack| stack.borrow().last().cloned())
}

/// Feedback handle of the innermost enclosing scope.
///
/// # Panics
///
/// Panics outside any [`UiProvider`] scope. Reaching for feedback there is a
/// wiring bug, not a runtime condition.
#[must_use]
pub fn use_ui() -> UiFeedback {
    match try_use_ui() {
        Some(ui) => ui,
        None => panic!("use_ui() must be called inside UiProvider::scope or UiProvider::scope_async"),
    }
}
