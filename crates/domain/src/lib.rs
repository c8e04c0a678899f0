//! Outbreak Domain - Core game vocabulary for the Outbreak client.
//!
//! This crate holds the pure domain types shared by the protocol and client
//! crates: phases, roles, players, the room aggregate, and the vote-tally
//! rules. It deliberately has no I/O, no async, and no wire-format concerns -
//! only serde derives so the protocol crate can reuse the vocabulary on the
//! wire.

pub mod error;
pub mod ids;
pub mod phase;
pub mod player;
pub mod role;
pub mod room;
pub mod vote;

pub use error::DomainError;
pub use ids::{PlayerNo, RoomId};
pub use phase::Phase;
pub use player::{Player, Position};
pub use role::{NightAction, Role, RoleSpec, Team};
pub use room::Room;
pub use vote::VoteTally;
