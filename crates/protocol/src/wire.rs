//! Websocket envelope frames.
//!
//! The channel multiplexes every topic over one socket. Three frame shapes:
//! the client subscribes to topics and sends payloads to destinations, the
//! server pushes payloads tagged with the topic they belong to.

use serde::{Deserialize, Serialize};

/// One frame on the wire, JSON with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireFrame {
    /// Client -> server: deliver everything published on `topic`.
    Subscribe { topic: String },
    /// Client -> server: fire-and-forget payload to a destination.
    Send {
        destination: String,
        payload: serde_json::Value,
    },
    /// Server -> client: a payload pushed on a subscribed topic.
    Message {
        topic: String,
        payload: serde_json::Value,
    },
}

impl WireFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
