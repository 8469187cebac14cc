//! Scriptable in-memory transport for session tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::document::PresencePayload;
use super::transport::{PresenceConnection, PresenceTransport, TransportError};

#[derive(Default)]
struct MockState {
    connects: AtomicUsize,
    closes: AtomicUsize,
    publish_attempts: AtomicUsize,
    failing_publishes: AtomicUsize,
    fail_connect: AtomicBool,
    hang_connect: AtomicBool,
    hang_publish: AtomicBool,
    lose_connection: AtomicBool,
    fail_close: AtomicBool,
    published: Mutex<Vec<PresencePayload>>,
}

/// Transport whose connections record every publish
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn hang_connect(&self, hang: bool) {
        self.state.hang_connect.store(hang, Ordering::SeqCst);
    }

    pub fn hang_publish(&self, hang: bool) {
        self.state.hang_publish.store(hang, Ordering::SeqCst);
    }

    pub fn lose_connection(&self, lost: bool) {
        self.state.lose_connection.store(lost, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` publishes fail with a transient error
    pub fn fail_next_publishes(&self, count: usize) {
        self.state.failing_publishes.store(count, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn publish_attempts(&self) -> usize {
        self.state.publish_attempts.load(Ordering::SeqCst)
    }

    pub fn successful_publishes(&self) -> usize {
        self.state.published.lock().len()
    }

    pub fn last_payload(&self) -> Option<PresencePayload> {
        self.state.published.lock().last().cloned()
    }
}

#[async_trait]
impl PresenceTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(
        &self,
        _application_id: &str,
    ) -> Result<Arc<dyn PresenceConnection>, TransportError> {
        if self.state.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("no client running".to_string()));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            state: self.state.clone(),
        }))
    }
}

struct MockConnection {
    state: Arc<MockState>,
}

#[async_trait]
impl PresenceConnection for MockConnection {
    async fn publish(&self, payload: &PresencePayload) -> Result<(), TransportError> {
        self.state.publish_attempts.fetch_add(1, Ordering::SeqCst);

        if self.state.hang_publish.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.lose_connection.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionLost("pipe closed".to_string()));
        }
        let failing = self.state.failing_publishes.load(Ordering::SeqCst);
        if failing > 0 {
            self.state
                .failing_publishes
                .store(failing - 1, Ordering::SeqCst);
            return Err(TransportError::Unavailable("network blip".to_string()));
        }

        self.state.published.lock().push(payload.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionLost("already gone".to_string()));
        }
        Ok(())
    }
}

/// Poll `condition` every few milliseconds for up to two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
