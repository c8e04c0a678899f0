//! Topic and destination string builders.
//!
//! Inbound topics live under `/sub/`, outbound destinations under `/pub/`.
//! Everything is keyed by room id; the lobby topic is global.

use outbreak_domain::RoomId;

use crate::events::ChatType;

// ---------------------------------------------------------------------------
// Subscribe topics
// ---------------------------------------------------------------------------

pub fn topic_lobby() -> String {
    "/sub/lobby".to_string()
}

/// Waiting-room state: joins, leaves, ready flags, host changes.
pub fn topic_room(room_id: RoomId) -> String {
    format!("/sub/room/{room_id}")
}

/// System topic: phase changes, vote results, outcomes, game over.
pub fn topic_system(room_id: RoomId) -> String {
    format!("/sub/system/{room_id}")
}

/// One chat topic per category per room.
pub fn topic_chat(room_id: RoomId, chat_type: ChatType) -> String {
    format!("/sub/chat/{room_id}/{}", chat_type.as_segment())
}

// ---------------------------------------------------------------------------
// Publish destinations
// ---------------------------------------------------------------------------

pub fn dest_room_enter(room_id: RoomId) -> String {
    format!("/pub/room/{room_id}/enter")
}

pub fn dest_room_leave(room_id: RoomId) -> String {
    format!("/pub/room/{room_id}/leave")
}

pub fn dest_room_ready(room_id: RoomId) -> String {
    format!("/pub/room/{room_id}/ready")
}

pub fn dest_room_start(room_id: RoomId) -> String {
    format!("/pub/room/{room_id}/start")
}

pub fn dest_room_kick(room_id: RoomId) -> String {
    format!("/pub/room/{room_id}/kick")
}

pub fn dest_game_move(room_id: RoomId) -> String {
    format!("/pub/game/{room_id}/move")
}

pub fn dest_game_chat(room_id: RoomId) -> String {
    format!("/pub/game/{room_id}/chat")
}

pub fn dest_game_skill(room_id: RoomId) -> String {
    format!("/pub/game/{room_id}/skill")
}

pub fn dest_game_vote(room_id: RoomId) -> String {
    format!("/pub/game/{room_id}/vote")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_topics_are_distinct_per_category() {
        let room = RoomId::new(9);
        let mut topics: Vec<_> = ChatType::ALL
            .iter()
            .map(|c| topic_chat(room, *c))
            .collect();
        topics.sort();
        topics.dedup();
        assert_eq!(topics.len(), 3);
    }

    #[test]
    fn topics_and_destinations_are_keyed_by_room() {
        assert_eq!(topic_system(RoomId::new(7)), "/sub/system/7");
        assert_eq!(dest_game_vote(RoomId::new(7)), "/pub/game/7/vote");
    }
}
