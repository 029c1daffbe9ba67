//! Notification hand-off between the request handler and the saga.

use common::NotificationEvent;
use tokio::sync::watch;

/// Single-writer, multi-reader holder for the captured notification.
///
/// Backed by a watch channel: a value published by the handler task is
/// visible to any later [`current`](Self::current) call from another task.
#[derive(Debug, Clone)]
pub struct NotificationState {
    tx: watch::Sender<NotificationEvent>,
}

impl NotificationState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(NotificationEvent::default());
        Self { tx }
    }

    /// Records a delivery. Returns true if the stored event changed.
    ///
    /// Once ready the stored event never changes again.
    pub fn record(&self, event: NotificationEvent) -> bool {
        self.tx.send_if_modified(|current| current.record(event))
    }

    /// Returns a snapshot of the captured event.
    pub fn current(&self) -> NotificationEvent {
        self.tx.borrow().clone()
    }

    /// Clears the captured event before a new run.
    pub fn reset(&self) {
        self.tx.send_replace(NotificationEvent::default());
    }
}

impl Default for NotificationState {
    fn default() -> Self {
        Self::new()
    }
}
