use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Sleep, sleep};

/// Single-slot reconnect timer owned by the signaling transport.
///
/// At most one reconnect is ever pending: scheduling again while a timer is
/// armed is a no-op, and a successful connection cancels the pending one.
pub struct ReconnectScheduler {
    backoff: Duration,
    pending: Option<Pin<Box<Sleep>>>,
}

impl ReconnectScheduler {
    pub fn new(backoff: Duration) -> Self {
        Self {
            backoff,
            pending: None,
        }
    }

    /// Arms the timer. Returns `false` if one was already pending.
    pub fn schedule(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(Box::pin(sleep(self.backoff)));
        true
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves when the armed timer fires and disarms it. Never resolves
    /// while nothing is scheduled. Cancel safe.
    pub async fn fired(&mut self) {
        match self.pending.as_mut() {
            Some(timer) => {
                timer.await;
                self.pending = None;
            }
            None => std::future::pending().await,
        }
    }
}
