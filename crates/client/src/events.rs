//! Session events delivered to presentation over the [`crate::EventBus`].

use outbreak_domain::{Phase, PlayerNo, Team};
use outbreak_protocol::ChatMessage;

use crate::channel::ConnectionState;

/// Everything the presentation layer can observe from the session core.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Transient connection indicator; never fatal.
    Connection(ConnectionState),
    /// Fired exactly once per actual phase transition.
    PhaseChanged {
        phase: Phase,
        remaining_seconds: u32,
    },
    /// Final vote mapping, voter -> target in voter order.
    VoteResult { targets: Vec<(PlayerNo, PlayerNo)> },
    /// Night resolution applied to the room snapshot.
    Outcome {
        deaths: Vec<PlayerNo>,
        healed: Option<PlayerNo>,
    },
    Chat(ChatMessage),
    /// The room snapshot changed (joins, leaves, movement, ready flags...).
    RoomChanged,
    GameOver { winner: Option<Team> },
    /// A submitted action was rejected; optimistic state has been rolled
    /// back to the last confirmed value.
    Rejected { reason: String },
}
