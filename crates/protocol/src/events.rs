//! Typed inbound events.
//!
//! [`PhaseEvent`] is the closed set of events the game session reacts to.
//! The `kind` of each variant fully determines its fields; the normalizer
//! guarantees no partially-filled event is ever constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outbreak_domain::{Phase, PlayerNo, Position, Role, Team};

/// Chat category, one topic per category per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatType {
    All,
    Infected,
    Dead,
}

impl ChatType {
    pub const ALL: [ChatType; 3] = [ChatType::All, ChatType::Infected, ChatType::Dead];

    /// Topic path segment for this category.
    pub fn as_segment(self) -> &'static str {
        match self {
            ChatType::All => "all",
            ChatType::Infected => "infected",
            ChatType::Dead => "dead",
        }
    }
}

/// One chat line, as delivered on a chat topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_type: ChatType,
    /// Absent for system lines.
    pub sender: Option<PlayerNo>,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Normalized server-pushed event.
///
/// Every inbound payload maps to exactly one of these variants or is
/// discarded by [`crate::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEvent {
    /// Phase change (or correction of the remaining time for the current
    /// phase - the server is authoritative over elapsed time).
    Phase { phase: Phase, remaining_seconds: u32 },
    /// Final vote mapping, voter -> target, in voter order.
    VoteResult { targets: Vec<(PlayerNo, PlayerNo)> },
    /// Night resolution: who died, who was saved.
    Outcome {
        deaths: Vec<PlayerNo>,
        healed: Option<PlayerNo>,
    },
    /// Chat line on any category topic.
    Chat(ChatMessage),
    /// Terminal signal, outside the five-phase cycle.
    GameOver { winner: Option<Team> },
}

/// Room-topic events: lobby and waiting-room state changes.
///
/// Unlike the heterogeneous system topic, the room topic speaks a tagged
/// schema, so plain serde does the decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    PlayerJoined {
        player_no: PlayerNo,
        nickname: String,
    },
    PlayerLeft {
        player_no: PlayerNo,
    },
    ReadyChanged {
        player_no: PlayerNo,
        ready: bool,
    },
    HostChanged {
        player_no: PlayerNo,
    },
    RoleAssigned {
        player_no: PlayerNo,
        role: Role,
    },
    PlayerMoved {
        player_no: PlayerNo,
        position: Position,
    },
    GameStarted,
}
