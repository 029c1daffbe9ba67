//! Webhook receiver port and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::NotificationEvent;

use crate::error::SagaError;

/// Lifecycle of the listener that captures the completion webhook.
///
/// The listener runs independently of the saga; the saga only starts it,
/// polls the captured event and stops it.
#[async_trait]
pub trait NotificationReceiver: Send + Sync {
    /// Binds the listener. Returns once it accepts connections.
    async fn start(&self) -> Result<(), SagaError>;

    /// Returns the notification captured so far.
    fn current(&self) -> NotificationEvent;

    /// Terminates the listener. Callable after a failed or partial start.
    async fn stop(&self);
}

#[derive(Debug, Default)]
struct InMemoryReceiverState {
    captured: NotificationEvent,
    delivery: Option<NotificationEvent>,
    deliver_after_polls: u32,
    running: bool,
    fail_on_start: bool,
    starts: u32,
    stops: u32,
    polls: u32,
}

/// In-memory receiver for testing.
///
/// A staged delivery becomes visible once the receiver is running and has
/// been polled the configured number of times, so tests can simulate
/// a notification that arrives partway through the wait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReceiver {
    state: Arc<RwLock<InMemoryReceiverState>>,
}

impl InMemoryReceiver {
    /// Creates a receiver that never receives a notification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a delivery visible from the first poll on.
    pub fn deliver(&self, event: NotificationEvent) {
        self.deliver_after_polls(event, 0);
    }

    /// Stages a delivery visible once `polls` polls have already happened.
    pub fn deliver_after_polls(&self, event: NotificationEvent, polls: u32) {
        let mut state = self.state.write().unwrap();
        state.delivery = Some(event);
        state.deliver_after_polls = polls;
    }

    pub fn set_fail_on_start(&self, fail: bool) {
        self.state.write().unwrap().fail_on_start = fail;
    }

    pub fn start_count(&self) -> u32 {
        self.state.read().unwrap().starts
    }

    pub fn stop_count(&self) -> u32 {
        self.state.read().unwrap().stops
    }

    pub fn poll_count(&self) -> u32 {
        self.state.read().unwrap().polls
    }

    pub fn is_running(&self) -> bool {
        self.state.read().unwrap().running
    }
}

#[async_trait]
impl NotificationReceiver for InMemoryReceiver {
    async fn start(&self) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        state.starts += 1;

        if state.fail_on_start {
            return Err(SagaError::LocalResource(
                "address already in use".to_string(),
            ));
        }

        state.running = true;
        state.captured = NotificationEvent::default();
        state.polls = 0;
        Ok(())
    }

    fn current(&self) -> NotificationEvent {
        let mut state = self.state.write().unwrap();
        if state.running && state.polls >= state.deliver_after_polls {
            if let Some(event) = state.delivery.clone() {
                state.captured.record(event);
            }
        }
        state.polls += 1;
        state.captured.clone()
    }

    async fn stop(&self) {
        let mut state = self.state.write().unwrap();
        state.running = false;
        state.stops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CollaborationId, SecretId};

    fn event() -> NotificationEvent {
        NotificationEvent::new(CollaborationId::new("1"), SecretId::new("result"))
    }

    #[tokio::test]
    async fn test_never_delivers_by_default() {
        let receiver = InMemoryReceiver::new();
        receiver.start().await.unwrap();

        for _ in 0..10 {
            assert!(!receiver.current().is_ready());
        }
        assert_eq!(receiver.poll_count(), 10);
    }

    #[tokio::test]
    async fn test_delivery_after_polls() {
        let receiver = InMemoryReceiver::new();
        receiver.deliver_after_polls(event(), 2);
        receiver.start().await.unwrap();

        assert!(!receiver.current().is_ready());
        assert!(!receiver.current().is_ready());
        assert_eq!(receiver.current(), event());
    }

    #[tokio::test]
    async fn test_no_delivery_before_start() {
        let receiver = InMemoryReceiver::new();
        receiver.deliver(event());
        assert!(!receiver.current().is_ready());
    }

    #[tokio::test]
    async fn test_fail_on_start_and_stop_counts() {
        let receiver = InMemoryReceiver::new();
        receiver.set_fail_on_start(true);

        let err = receiver.start().await.unwrap_err();
        assert!(matches!(err, SagaError::LocalResource(_)));
        assert!(!receiver.is_running());

        receiver.stop().await;
        assert_eq!(receiver.start_count(), 1);
        assert_eq!(receiver.stop_count(), 1);
    }
}
