//! Lumen core library
//!
//! Keeps a presence status alive against a pluggable transport and manages
//! the local catalog of image assets that status can reference.

pub mod constants;
pub mod paths;
pub mod presence;
pub mod storage;

pub use presence::{
    ConnectError, PresenceConnection, PresenceDocument, PresencePayload, PresenceTransport,
    SessionController, SessionState, SharedDocument, TransportError,
};
pub use storage::{AssetError, AssetRecord, AssetStore, Config, ConfigError, ConfigStore};
