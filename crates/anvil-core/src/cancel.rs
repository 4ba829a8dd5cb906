//! Cooperative cancellation.
//!
//! `tokio_util::sync::CancellationToken` would be the obvious choice, but it
//! drags in `tokio-util` for a single type; we hand-roll the same shape over
//! an `AtomicBool` plus a `tokio::sync::Notify` so every suspension point in
//! the resolver/executor/orchestrator pipeline can check or await
//! cancellation without an extra dependency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable cancellation signal. Cloning shares the same underlying flag;
/// cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark this token (and every clone of it) cancelled. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled, otherwise waits.
    ///
    /// Call this at suspension points between plan steps; it's the async
    /// equivalent of checking `is_cancelled()` but avoids busy-polling.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
            if self.is_cancelled() {
                return;
            }
        }
    }

    /// Derive a child token: cancelling the parent cancels the child, but
    /// cancelling the child does not propagate back up. Used to scope
    /// cancellation to a single sub-install within a larger operation.
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        let parent = self.clone();
        let child_for_task = child.clone();
        tokio::spawn(async move {
            parent.cancelled().await;
            child_for_task.cancel();
        });
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_is_observed_by_is_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancellation wait timed out")
            .unwrap();
    }

    #[tokio::test]
    async fn child_token_is_cancelled_when_parent_is() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        parent.cancel();
        tokio::time::timeout(Duration::from_secs(1), child.cancelled())
            .await
            .expect("child token was not cancelled in time");
        assert!(child.is_cancelled());
    }
}
