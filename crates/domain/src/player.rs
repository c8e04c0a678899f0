//! Player entity and 2D position value object.

use serde::{Deserialize, Serialize};

use crate::{DomainError, PlayerNo, Role};

/// A 2D position inside the game scene.
///
/// Compared exactly: the self-echo guard in the reconciler relies on the
/// server echoing back the same coordinates it was sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A participant in a room.
///
/// Created on room join, mutated only by server-confirmed events, dropped on
/// room teardown. `is_dead` is monotonic: once true it never flips back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub player_no: PlayerNo,
    pub nickname: String,
    /// Revealed by the server; `None` until role assignment.
    pub role: Option<Role>,
    pub is_dead: bool,
    pub is_host: bool,
    pub is_ready: bool,
    pub position: Position,
}

impl Player {
    pub fn new(player_no: PlayerNo, nickname: impl Into<String>) -> Result<Self, DomainError> {
        let nickname = nickname.into();
        if nickname.trim().is_empty() {
            return Err(DomainError::validation("nickname cannot be empty"));
        }
        Ok(Self {
            player_no,
            nickname,
            role: None,
            is_dead: false,
            is_host: false,
            is_ready: false,
            position: Position::default(),
        })
    }

    /// Mark the player dead. Idempotent; death never reverts.
    pub fn mark_dead(&mut self) {
        self.is_dead = true;
    }

    pub fn reveal_role(&mut self, role: Role) {
        self.role = Some(role);
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }
}
