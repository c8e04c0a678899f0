//! Outbreak Protocol - Shared wire contract between client and server.
//!
//! This crate contains everything that crosses the socket:
//! - Inbound payload normalization into typed [`PhaseEvent`]s
//! - Outbound [`ClientIntent`] payloads with fixed schemas
//! - The websocket [`WireFrame`] envelope (subscribe / send / message)
//! - Topic and destination string builders
//!
//! # Design Principles
//!
//! 1. **No business logic** - classification and serialization only
//! 2. **Total normalization** - every inbound payload maps to exactly one
//!    typed event or an explicit discard; malformed input never panics and is
//!    never partially applied
//! 3. **Minimal dependencies** - serde, serde_json, chrono, tracing

pub mod events;
pub mod intents;
pub mod normalize;
pub mod topics;
pub mod wire;

pub use events::{ChatMessage, ChatType, PhaseEvent, RoomEvent};
pub use intents::ClientIntent;
pub use normalize::{normalize, normalize_value};
pub use wire::WireFrame;
