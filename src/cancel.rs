//! Cooperative cancellation for a run that is waiting on the service.
//!
//! A [`CancelToken`] is a cloneable handle around a `tokio::sync::watch`
//! flag. Every stage of a conversion, and every status request and backoff
//! sleep inside the poller, is raced against [`CancelToken::cancelled`].
//! Tripping the token from another task (the CLI does it on Ctrl-C) ends the
//! run with [`crate::ConvertError::Cancelled`] at whatever point it reached.

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable cancellation flag. All clones observe the same state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
