//! Cooperative cancellation shared by the rate limiter, the crawler
//! engine, job executors, and the scheduler's graceful shutdown.
//!
//! Deliberately not `tokio_util::CancellationToken` — the workspace
//! keeps its dependency surface to what each crate actually needs, and
//! a `Notify` plus an `AtomicBool` covers every use here: check-then-act
//! at queue dequeue points, and a `select!` arm to wake a sleeping
//! waiter immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable handle; cancelling through any clone cancels all of them.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled, otherwise waits for
    /// the next `cancel()` call. Safe to race against a timer in
    /// `tokio::select!` — a cancellation that lands between the check
    /// and the `notified()` registration is still observed because
    /// `Notify` buffers one permit when there is no waiter yet.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
