//! Dev-session frames exchanged over the trigger forwarding WebSocket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::types::EventId;

/// A remote trigger event forwarded to the local runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Event identifier, echoed back in the result.
    pub id: EventId,
    /// Trigger kind (e.g. `webhook`, `schedule`).
    pub trigger: String,
    /// Event payload as delivered by the platform.
    #[serde(default)]
    pub payload: Value,
    /// When the platform received the event.
    pub received_at: DateTime<Utc>,
}

/// Outcome of delivering a trigger event to the local runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResult {
    /// Event this result answers.
    pub event_id: EventId,
    /// HTTP status returned by the local runtime, or `None` if delivery failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Response body or delivery error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A frame on the dev-session WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DevMessage {
    /// Server → client: the session is attached.
    Ready {
        /// Session identifier.
        session_id: String,
    },
    /// Server → client: a trigger fired.
    Event(TriggerEvent),
    /// Client → server: delivery result.
    Result(TriggerResult),
    /// Server → client: the session ended.
    Closed {
        /// Reason given by the server.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl DevMessage {
    /// Decodes a frame from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a known frame.
    pub fn from_json(text: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encodes the frame as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
