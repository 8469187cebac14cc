//! Transport that records presence updates in the log and on stdout
//!
//! Used by `lumen run` when no remote transport is plugged in.

use std::sync::Arc;

use async_trait::async_trait;
use lumen_core::{PresenceConnection, PresencePayload, PresenceTransport, TransportError};

pub struct LogTransport;

#[async_trait]
impl PresenceTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn connect(
        &self,
        application_id: &str,
    ) -> Result<Arc<dyn PresenceConnection>, TransportError> {
        tracing::info!(app_id = %application_id, "Log transport opened");
        Ok(Arc::new(LogConnection {
            application_id: application_id.to_string(),
        }))
    }
}

struct LogConnection {
    application_id: String,
}

#[async_trait]
impl PresenceConnection for LogConnection {
    async fn publish(&self, payload: &PresencePayload) -> Result<(), TransportError> {
        let json =
            serde_json::to_string(payload).map_err(|e| TransportError::Rejected(e.to_string()))?;
        tracing::info!(app_id = %self.application_id, payload = %json, "Presence update");
        println!("  presence: {}", json);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        tracing::info!(app_id = %self.application_id, "Log transport closed");
        Ok(())
    }
}
