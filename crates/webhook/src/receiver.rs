//! Webhook receiver lifecycle.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use common::NotificationEvent;
use saga::{NotificationReceiver, SagaError};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::create_app;
use crate::error::ReceiverError;
use crate::state::NotificationState;

/// How long in-flight requests get to finish before the server task is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

struct RunningServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Listener for `PUT /notify` running on its own tokio task.
///
/// The server task shares nothing with the caller except the
/// [`NotificationState`], so a panic in a handler never reaches the saga.
/// `stop` is idempotent and the receiver can be started again afterwards.
pub struct WebhookReceiver {
    addr: SocketAddr,
    startup_delay: Duration,
    state: NotificationState,
    server: Mutex<Option<RunningServer>>,
}

impl WebhookReceiver {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            startup_delay: Duration::ZERO,
            state: NotificationState::new(),
            server: Mutex::new(None),
        }
    }

    /// Waits this long after binding before `start` returns.
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// The notification state shared with the request handler.
    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    /// Address the listener is bound to, if running.
    ///
    /// Differs from the configured address when binding port 0.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().await.as_ref().map(|s| s.local_addr)
    }

    pub async fn is_running(&self) -> bool {
        self.server
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Binds the listener and spawns the server task.
    ///
    /// Any previously captured notification is cleared.
    pub async fn listen(&self) -> Result<SocketAddr, ReceiverError> {
        let mut server = self.server.lock().await;
        if let Some(running) = server.as_ref() {
            return Err(ReceiverError::AlreadyRunning(running.local_addr));
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ReceiverError::Bind {
                addr: self.addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ReceiverError::Bind {
            addr: self.addr,
            source,
        })?;

        self.state.reset();
        let app = create_app(self.state.clone());
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = signal.await;
            });
            if let Err(e) = serve.await {
                tracing::error!(error = %e, "webhook receiver stopped with an error");
            }
        });

        tracing::info!(addr = %local_addr, "webhook receiver listening");
        *server = Some(RunningServer {
            local_addr,
            shutdown,
            handle,
        });
        drop(server);

        if !self.startup_delay.is_zero() {
            tokio::time::sleep(self.startup_delay).await;
        }
        Ok(local_addr)
    }

    /// Shuts the server down, aborting it if it outlives the grace period.
    pub async fn shutdown(&self) {
        let Some(running) = self.server.lock().await.take() else {
            return;
        };

        let _ = running.shutdown.send(());
        let mut handle = running.handle;
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
            tracing::warn!("webhook receiver did not drain in time, aborting");
            handle.abort();
            let _ = handle.await;
        }
        tracing::info!(addr = %running.local_addr, "webhook receiver stopped");
    }
}

#[async_trait]
impl NotificationReceiver for WebhookReceiver {
    async fn start(&self) -> Result<(), SagaError> {
        self.listen().await?;
        Ok(())
    }

    fn current(&self) -> NotificationEvent {
        self.state.current()
    }

    async fn stop(&self) {
        self.shutdown().await;
    }
}
