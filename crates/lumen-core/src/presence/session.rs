//! Presence session lifecycle
//!
//! `SessionController` owns the transport connection and the single
//! background task that republishes the shared document every refresh
//! interval. State transitions:
//!
//! - `Disconnected`/`Failed` -> `Connecting` on [`SessionController::connect`]
//! - `Connecting` -> `Connected` (loop starts) or `Failed(reason)`
//! - `Connected` -> `Disconnected` on [`SessionController::disconnect`] or
//!   when the transport reports the connection dead

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::document::SharedDocument;
use super::transport::{PresenceConnection, PresenceTransport, TransportError};
use crate::constants::session;
use crate::storage::unix_timestamp;

/// Session status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("application id is empty")]
    EmptyAppId,
    #[error("a presence session is already active")]
    AlreadyConnected,
    #[error("failed to connect: {0}")]
    Transport(#[from] TransportError),
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
}

/// Refresh and timeout settings for a session
#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    pub refresh_interval: Duration,
    pub publish_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            refresh_interval: session::REFRESH_INTERVAL,
            publish_timeout: session::PUBLISH_TIMEOUT,
            connect_timeout: session::CONNECT_TIMEOUT,
        }
    }
}

/// Connection plus the refresh task publishing on it
struct ActiveSession {
    application_id: String,
    connection: Arc<dyn PresenceConnection>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Manages connect/refresh/disconnect against a [`PresenceTransport`]
///
/// `connect` and `disconnect` take `&mut self`, so calls are serialized by
/// the owner. At most one connection and one refresh task exist at a time.
pub struct SessionController {
    transport: Arc<dyn PresenceTransport>,
    state: Arc<watch::Sender<SessionState>>,
    active: Option<ActiveSession>,
    timings: SessionTimings,
}

impl SessionController {
    pub fn new(transport: Arc<dyn PresenceTransport>) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            state: Arc::new(state),
            active: None,
            timings: SessionTimings::default(),
        }
    }

    /// Override the default refresh interval and timeouts
    pub fn with_timings(mut self, timings: SessionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn current_state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch state transitions, including those made by the refresh loop
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Application id of the live session, if any
    pub fn application_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.application_id.as_str())
    }

    /// Open the transport and start refreshing `document`
    pub async fn connect(
        &mut self,
        application_id: &str,
        document: SharedDocument,
    ) -> Result<(), ConnectError> {
        let application_id = application_id.trim();
        if application_id.is_empty() {
            return Err(ConnectError::EmptyAppId);
        }

        if matches!(
            self.current_state(),
            SessionState::Connecting | SessionState::Connected
        ) {
            return Err(ConnectError::AlreadyConnected);
        }

        // A loop that ended on its own still owns a connection to close
        if let Some(stale) = self.active.take() {
            self.shutdown(stale).await;
        }

        self.state.send_replace(SessionState::Connecting);
        info!(
            app_id = %application_id,
            transport = self.transport.name(),
            "Connecting presence session"
        );

        let connect_timeout = self.timings.connect_timeout;
        let connecting = self.transport.connect(application_id);
        let connection = match timeout(connect_timeout, connecting).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return Err(self.fail(ConnectError::Transport(e))),
            Err(_) => return Err(self.fail(ConnectError::Timeout(connect_timeout))),
        };

        self.state.send_replace(SessionState::Connected);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(RefreshLoop {
            connection: connection.clone(),
            document,
            state: self.state.clone(),
            cancel: cancel.clone(),
            timings: self.timings,
        }));

        self.active = Some(ActiveSession {
            application_id: application_id.to_string(),
            connection,
            cancel,
            handle,
        });

        info!(app_id = %application_id, "Presence session connected");
        Ok(())
    }

    /// Stop the refresh loop and close the connection. No-op when nothing is active.
    pub async fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            let app_id = active.application_id.clone();
            self.shutdown(active).await;
            info!(app_id = %app_id, "Presence session disconnected");
        }

        self.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected {
                false
            } else {
                *state = SessionState::Disconnected;
                true
            }
        });
    }

    fn fail(&self, error: ConnectError) -> ConnectError {
        warn!(error = %error, "Presence session failed to connect");
        self.state.send_replace(SessionState::Failed(error.to_string()));
        error
    }

    /// Signal the loop, wait for it (bounded by one interval), then close once
    async fn shutdown(&self, active: ActiveSession) {
        let ActiveSession {
            connection,
            cancel,
            mut handle,
            ..
        } = active;

        cancel.cancel();
        match timeout(self.timings.refresh_interval, &mut handle).await {
            Ok(Ok(())) => debug!("Refresh loop finished"),
            Ok(Err(e)) => warn!(error = %e, "Refresh loop ended abnormally"),
            Err(_) => {
                warn!("Refresh loop did not stop in time, aborting");
                handle.abort();
            }
        }

        if let Err(e) = connection.close().await {
            debug!(error = %e, "Ignoring error while closing presence connection");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

struct RefreshLoop {
    connection: Arc<dyn PresenceConnection>,
    document: SharedDocument,
    state: Arc<watch::Sender<SessionState>>,
    cancel: CancellationToken,
    timings: SessionTimings,
}

/// Publish immediately, then once per interval, until cancelled or the
/// connection is reported dead. Transient failures are logged and retried
/// on the next tick.
async fn refresh_loop(ctx: RefreshLoop) {
    let RefreshLoop {
        connection,
        document,
        state,
        cancel,
        timings,
    } = ctx;

    let mut ticker = tokio::time::interval(timings.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let connected = matches!(*state.borrow(), SessionState::Connected);
        if !connected {
            break;
        }

        let payload = document.write().prepare_payload(unix_timestamp());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = timeout(timings.publish_timeout, connection.publish(&payload)) => outcome,
        };

        match outcome {
            Ok(Ok(())) => {
                if consecutive_failures > 0 {
                    info!(consecutive_failures, "Presence publish recovered");
                }
                consecutive_failures = 0;
                debug!(?payload, "Presence published");
            }
            Ok(Err(e)) if e.is_fatal() => {
                warn!(error = %e, "Presence connection lost, ending session");
                state.send_if_modified(|s| {
                    if *s == SessionState::Connected {
                        *s = SessionState::Disconnected;
                        true
                    } else {
                        false
                    }
                });
                break;
            }
            Ok(Err(e)) => {
                consecutive_failures += 1;
                warn!(
                    error = %e,
                    consecutive_failures,
                    "Presence publish failed, retrying next interval"
                );
            }
            Err(_) => {
                consecutive_failures += 1;
                warn!(
                    timeout = ?timings.publish_timeout,
                    consecutive_failures,
                    "Presence publish timed out, retrying next interval"
                );
            }
        }
    }

    debug!("Refresh loop stopped");
}
