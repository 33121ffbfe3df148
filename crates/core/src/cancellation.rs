use std::sync::Arc;

use tokio::sync::watch;

use crate::{AppError, AppResult};

/// Cloneable cancellation signal.
///
/// Every clone observes the same flag. Once cancelled the signal never
/// resets, so a stage that checks it before starting either runs to
/// completion or does not start at all.
#[derive(Debug, Clone)]
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    /// Creates a signal that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Requests cancellation for every holder of this signal.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns `AppError::Cancelled` once cancellation was requested.
    pub fn check(&self) -> AppResult<()> {
        if self.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        Ok(())
    }

    /// Waits until cancellation is requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}
