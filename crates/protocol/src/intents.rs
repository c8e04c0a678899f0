//! Outbound intent payloads.
//!
//! Every player action published to the server, each with a fixed schema:
//! room id, actor, and the action-specific fields. Lobby intents
//! (enter/leave/ready/start/kick) are idempotent signals; the server is free
//! to ignore repeats.

use serde::{Deserialize, Serialize};

use outbreak_domain::{PlayerNo, Position, RoomId};

use crate::events::ChatType;

/// Messages from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientIntent {
    EnterRoom {
        room_id: RoomId,
        player_no: PlayerNo,
        nickname: String,
    },
    LeaveRoom {
        room_id: RoomId,
        player_no: PlayerNo,
    },
    Ready {
        room_id: RoomId,
        player_no: PlayerNo,
        ready: bool,
    },
    StartGame {
        room_id: RoomId,
        player_no: PlayerNo,
    },
    KickPlayer {
        room_id: RoomId,
        player_no: PlayerNo,
        target: PlayerNo,
    },
    Move {
        room_id: RoomId,
        player_no: PlayerNo,
        position: Position,
    },
    Chat {
        room_id: RoomId,
        player_no: PlayerNo,
        chat_type: ChatType,
        content: String,
    },
    UseSkill {
        room_id: RoomId,
        player_no: PlayerNo,
        target: PlayerNo,
    },
    CastVote {
        room_id: RoomId,
        player_no: PlayerNo,
        target: PlayerNo,
    },
}

impl ClientIntent {
    /// The destination this intent publishes to.
    pub fn destination(&self) -> String {
        use crate::topics;
        match self {
            ClientIntent::EnterRoom { room_id, .. } => topics::dest_room_enter(*room_id),
            ClientIntent::LeaveRoom { room_id, .. } => topics::dest_room_leave(*room_id),
            ClientIntent::Ready { room_id, .. } => topics::dest_room_ready(*room_id),
            ClientIntent::StartGame { room_id, .. } => topics::dest_room_start(*room_id),
            ClientIntent::KickPlayer { room_id, .. } => topics::dest_room_kick(*room_id),
            ClientIntent::Move { room_id, .. } => topics::dest_game_move(*room_id),
            ClientIntent::Chat { room_id, .. } => topics::dest_game_chat(*room_id),
            ClientIntent::UseSkill { room_id, .. } => topics::dest_game_skill(*room_id),
            ClientIntent::CastVote { room_id, .. } => topics::dest_game_vote(*room_id),
        }
    }
}
