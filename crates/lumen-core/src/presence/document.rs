//! Presence document and the payload published from it

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Document shared between the caller (editor) and the refresh loop (reader)
pub type SharedDocument = Arc<RwLock<PresenceDocument>>;

/// The editable presence fields
///
/// Blank strings are allowed here; they are dropped when the payload is
/// built, so a field set to `"   "` is never published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceDocument {
    /// Top line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Bottom line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_image_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_image_text: Option<String>,
    pub show_elapsed_time: bool,
    /// Unix seconds; runtime only, never persisted
    #[serde(skip)]
    pub start_timestamp: Option<i64>,
}

impl PresenceDocument {
    /// Wrap the document for sharing with a session
    pub fn shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    /// Toggle elapsed-time display. Turning it off clears the start timestamp.
    pub fn set_show_elapsed_time(&mut self, enabled: bool) {
        self.show_elapsed_time = enabled;
        if !enabled {
            self.start_timestamp = None;
        }
    }

    /// Stamp the start time once while elapsed time is shown, clear it otherwise
    pub fn sync_start_timestamp(&mut self, now: i64) {
        if self.show_elapsed_time {
            self.start_timestamp.get_or_insert(now);
        } else {
            self.start_timestamp = None;
        }
    }

    /// Apply the timestamp rule and build the payload in one step
    pub fn prepare_payload(&mut self, now: i64) -> PresencePayload {
        self.sync_start_timestamp(now);
        self.to_payload()
    }

    /// Build the publishable payload, omitting blank fields
    pub fn to_payload(&self) -> PresencePayload {
        PresencePayload {
            details: non_blank(&self.details),
            state: non_blank(&self.state),
            large_image: non_blank(&self.large_image_key),
            large_text: non_blank(&self.large_image_text),
            small_image: non_blank(&self.small_image_key),
            small_text: non_blank(&self.small_image_text),
            start: if self.show_elapsed_time {
                self.start_timestamp
            } else {
                None
            },
        }
    }

    /// Non-blank image keys, large first
    pub fn image_keys(&self) -> Vec<String> {
        [&self.large_image_key, &self.small_image_key]
            .into_iter()
            .filter_map(non_blank)
            .collect()
    }
}

/// Fields handed to the transport on each publish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresencePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
