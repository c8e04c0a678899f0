//! Game phases.
//!
//! Exactly one phase is active at a time. Transitions are server-driven; the
//! client never infers a phase on its own. The terminal game-over signal is
//! intentionally *not* part of this enum - it is outside the phase cycle and
//! modeled separately by the protocol and the phase machine.

use serde::{Deserialize, Serialize};

/// A named period of gameplay with a fixed allowed action set and a
/// server-controlled duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    DayDiscussion,
    DayVote,
    DayFinalStatement,
    DayFinalVote,
    NightAction,
}

impl Phase {
    /// All phases, in cycle order.
    pub const ALL: [Phase; 5] = [
        Phase::DayDiscussion,
        Phase::DayVote,
        Phase::DayFinalStatement,
        Phase::DayFinalVote,
        Phase::NightAction,
    ];

    pub fn is_day(self) -> bool {
        !matches!(self, Phase::NightAction)
    }

    /// Whether vote submissions are accepted during this phase.
    pub fn accepts_votes(self) -> bool {
        matches!(self, Phase::DayVote | Phase::DayFinalVote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_server_vocabulary() {
        let json = serde_json::to_string(&Phase::DayFinalStatement).expect("serialize");
        assert_eq!(json, "\"DAY_FINAL_STATEMENT\"");
        let night: Phase = serde_json::from_str("\"NIGHT_ACTION\"").expect("deserialize");
        assert_eq!(night, Phase::NightAction);
    }

    #[test]
    fn all_lists_every_phase_once() {
        for phase in Phase::ALL {
            assert_eq!(Phase::ALL.iter().filter(|p| **p == phase).count(), 1);
        }
    }
}
