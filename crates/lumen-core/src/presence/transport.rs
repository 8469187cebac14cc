//! Presence transport boundary
//!
//! The session only needs three capabilities from the remote side: open a
//! connection for an application id, publish a payload on it, and close it.
//! How those map onto a wire protocol is up to the implementation.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::document::PresencePayload;

/// Errors reported by a transport or one of its connections
#[derive(Debug, Error)]
pub enum TransportError {
    /// Remote endpoint not reachable right now
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    /// Remote endpoint refused the request
    #[error("transport rejected request: {0}")]
    Rejected(String),
    /// The connection itself is dead; nothing more can be published on it
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether the connection must be abandoned
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::ConnectionLost(_))
    }
}

/// Opens presence connections
#[async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Name of this transport (for logging)
    fn name(&self) -> &'static str;

    /// Open a connection for the given application id
    async fn connect(
        &self,
        application_id: &str,
    ) -> Result<Arc<dyn PresenceConnection>, TransportError>;
}

/// A live connection returned by [`PresenceTransport::connect`]
#[async_trait]
pub trait PresenceConnection: Send + Sync {
    /// Replace the published presence with `payload`
    async fn publish(&self, payload: &PresencePayload) -> Result<(), TransportError>;

    /// Tear the connection down
    async fn close(&self) -> Result<(), TransportError>;
}
