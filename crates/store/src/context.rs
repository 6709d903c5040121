//! Caller context threaded through transactions.
//!
//! A [`Context`] travels with a transaction and reappears in the
//! [`TriggerEvent`](crate::TriggerEvent) handed to trigger callbacks. Its
//! [`CancelToken`] is checked between iterator steps of long prefix scans;
//! once cancelled, scans fail with `StoreError::Cancelled` and the
//! transaction stays abortable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Clones observe the same flag; cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the token to cancelled. Irreversible.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Opaque caller context carried by a transaction.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<CancelToken>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context honoring the given cancellation token.
    pub fn with_cancel(token: CancelToken) -> Self {
        Context {
            cancel: Some(token),
        }
    }

    /// True if the attached token, if any, has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(CancelToken::is_cancelled)
            .unwrap_or(false)
    }
}
