//! Presence publishing
//!
//! - `document`: editable fields and the payload built from them
//! - `transport`: the connect/publish/close capability the session drives
//! - `session`: lifecycle state machine and background refresh loop

mod document;
mod session;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use document::{PresenceDocument, PresencePayload, SharedDocument};
pub use session::{ConnectError, SessionController, SessionState, SessionTimings};
pub use transport::{PresenceConnection, PresenceTransport, TransportError};
