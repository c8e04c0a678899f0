//! Room aggregate: the client-side mirror of one game session.
//!
//! Owned by the game session; the presentation layer only ever receives a
//! cloned snapshot. Participant keys are stable for the whole session, so a
//! `BTreeMap` keeps iteration order deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DomainError, Phase, Player, PlayerNo, Position, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: crate::RoomId,
    pub title: String,
    participants: BTreeMap<PlayerNo, Player>,
    pub current_phase: Option<Phase>,
    pub remaining_seconds: u32,
}

impl Room {
    pub fn new(room_id: crate::RoomId, title: impl Into<String>) -> Self {
        Self {
            room_id,
            title: title.into(),
            participants: BTreeMap::new(),
            current_phase: None,
            remaining_seconds: 0,
        }
    }

    pub fn participants(&self) -> impl Iterator<Item = &Player> {
        self.participants.values()
    }

    pub fn participant(&self, player_no: PlayerNo) -> Option<&Player> {
        self.participants.get(&player_no)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn alive_count(&self) -> usize {
        self.participants.values().filter(|p| p.is_alive()).count()
    }

    pub fn join(&mut self, player: Player) -> Result<(), DomainError> {
        if self.participants.contains_key(&player.player_no) {
            return Err(DomainError::constraint(format!(
                "player {} already in room {}",
                player.player_no, self.room_id
            )));
        }
        self.participants.insert(player.player_no, player);
        Ok(())
    }

    pub fn leave(&mut self, player_no: PlayerNo) -> Result<Player, DomainError> {
        self.participants
            .remove(&player_no)
            .ok_or_else(|| DomainError::not_found("player", player_no))
    }

    /// Assign the host. Exactly one host at a time: any previous holder loses
    /// the flag first.
    pub fn set_host(&mut self, player_no: PlayerNo) -> Result<(), DomainError> {
        if !self.participants.contains_key(&player_no) {
            return Err(DomainError::not_found("player", player_no));
        }
        for player in self.participants.values_mut() {
            player.is_host = player.player_no == player_no;
        }
        Ok(())
    }

    pub fn host(&self) -> Option<PlayerNo> {
        self.participants
            .values()
            .find(|p| p.is_host)
            .map(|p| p.player_no)
    }

    pub fn set_ready(&mut self, player_no: PlayerNo, ready: bool) -> Result<(), DomainError> {
        let player = self
            .participants
            .get_mut(&player_no)
            .ok_or_else(|| DomainError::not_found("player", player_no))?;
        player.is_ready = ready;
        Ok(())
    }

    pub fn reveal_role(&mut self, player_no: PlayerNo, role: Role) -> Result<(), DomainError> {
        let player = self
            .participants
            .get_mut(&player_no)
            .ok_or_else(|| DomainError::not_found("player", player_no))?;
        player.reveal_role(role);
        Ok(())
    }

    pub fn set_position(&mut self, player_no: PlayerNo, position: Position) {
        if let Some(player) = self.participants.get_mut(&player_no) {
            player.position = position;
        }
    }

    /// Apply a server-confirmed night outcome. Deaths are monotonic; unknown
    /// player numbers are ignored rather than treated as errors, since the
    /// server may reference a participant that already left.
    pub fn apply_outcome(&mut self, deaths: &[PlayerNo], healed: Option<PlayerNo>) {
        for no in deaths {
            if let Some(player) = self.participants.get_mut(no) {
                player.mark_dead();
            }
        }
        // A heal carries no state change on its own; the healed player simply
        // did not appear in the death list. Kept for presentation.
        let _ = healed;
    }

    pub fn set_phase(&mut self, phase: Phase, remaining_seconds: u32) {
        self.current_phase = Some(phase);
        self.remaining_seconds = remaining_seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoomId;

    fn room_with(players: &[u32]) -> Room {
        let mut room = Room::new(RoomId::new(11), "last light");
        for no in players {
            room.join(Player::new(PlayerNo::new(*no), format!("p{no}")).expect("player"))
                .expect("join");
        }
        room
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let mut room = room_with(&[1]);
        let dup = Player::new(PlayerNo::new(1), "again").expect("player");
        assert!(matches!(room.join(dup), Err(DomainError::Constraint(_))));
        assert_eq!(room.participant_count(), 1);
    }

    #[test]
    fn exactly_one_host_at_a_time() {
        let mut room = room_with(&[1, 2, 3]);
        room.set_host(PlayerNo::new(1)).expect("host 1");
        room.set_host(PlayerNo::new(3)).expect("host 3");
        assert_eq!(room.host(), Some(PlayerNo::new(3)));
        let hosts = room.participants().filter(|p| p.is_host).count();
        assert_eq!(hosts, 1);
    }

    #[test]
    fn outcome_deaths_are_applied_and_monotonic() {
        let mut room = room_with(&[1, 2]);
        room.apply_outcome(&[PlayerNo::new(2)], None);
        room.apply_outcome(&[PlayerNo::new(2)], Some(PlayerNo::new(1)));
        assert!(room.participant(PlayerNo::new(2)).expect("p2").is_dead);
        assert_eq!(room.alive_count(), 1);
    }

    #[test]
    fn unknown_death_target_is_ignored() {
        let mut room = room_with(&[1]);
        room.apply_outcome(&[PlayerNo::new(9)], None);
        assert_eq!(room.alive_count(), 1);
    }
}
