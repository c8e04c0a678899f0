//! Local player action reconciler.
//!
//! Merges locally-predicted state (movement, skill target, vote target) with
//! server-confirmed state. Three load-bearing rules:
//!
//! - **Self-echo guard**: a server update for the local player equal to the
//!   last locally-sent value is skipped, so echoed self-updates never jitter
//!   an in-flight prediction. Differing values are authoritative and
//!   overwrite the prediction.
//! - **One-shot latches**: once a skill or vote has been predicted, further
//!   predictions of that category are rejected client-side until the latch
//!   resets - exactly on transition into the corresponding phase, never
//!   mid-phase. This runs before any network call.
//! - **Remote players are never predicted**; their updates apply directly.

use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

use outbreak_domain::{Phase, PlayerNo, Position};

/// An in-flight, unconfirmed player intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalAction {
    Move(Position),
    SkillTarget(PlayerNo),
    Vote(PlayerNo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Movement,
    Skill,
    Vote,
}

impl LocalAction {
    pub fn category(&self) -> ActionCategory {
        match self {
            LocalAction::Move(_) => ActionCategory::Movement,
            LocalAction::SkillTarget(_) => ActionCategory::Skill,
            LocalAction::Vote(_) => ActionCategory::Vote,
        }
    }
}

/// Stale-submission rejections, surfaced as local no-ops (disabled button),
/// never as network calls.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PredictError {
    #[error("night action already used this phase")]
    SkillAlreadyUsed,
    #[error("vote already cast this phase")]
    VoteAlreadyCast,
}

/// A prediction awaiting server confirmation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingAction {
    pub id: Uuid,
    pub action: LocalAction,
    pub issued_at: Instant,
}

/// How a server position update was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerApply {
    /// Echo of our own last-sent value; skipped.
    LocalEcho,
    /// Authoritative correction of the local prediction.
    LocalCorrection,
    /// Update for a remote player; apply directly.
    Remote,
}

#[derive(Debug)]
pub struct Reconciler {
    local_player: PlayerNo,
    confirmed_position: Position,
    predicted_position: Position,
    last_sent_position: Option<Position>,
    pending: Vec<PendingAction>,
    skill_used: bool,
    has_voted: bool,
    confirm_timeout: Duration,
}

pub type SharedReconciler = std::sync::Arc<std::sync::Mutex<Reconciler>>;

impl Reconciler {
    pub fn new(local_player: PlayerNo, confirm_timeout: Duration) -> Self {
        Self {
            local_player,
            confirmed_position: Position::default(),
            predicted_position: Position::default(),
            last_sent_position: None,
            pending: Vec::new(),
            skill_used: false,
            has_voted: false,
            confirm_timeout,
        }
    }

    /// Optimistically apply an action and enqueue it for confirmation.
    ///
    /// Skill and vote predictions are one-shot per phase; repeats are
    /// rejected here, before anything touches the channel.
    pub fn predict(&mut self, action: LocalAction) -> Result<Uuid, PredictError> {
        match action.category() {
            ActionCategory::Skill if self.skill_used => return Err(PredictError::SkillAlreadyUsed),
            ActionCategory::Vote if self.has_voted => return Err(PredictError::VoteAlreadyCast),
            _ => {}
        }
        match action {
            LocalAction::Move(position) => {
                self.predicted_position = position;
                self.last_sent_position = Some(position);
            }
            LocalAction::SkillTarget(_) => self.skill_used = true,
            LocalAction::Vote(_) => self.has_voted = true,
        }
        let id = Uuid::new_v4();
        self.pending.push(PendingAction {
            id,
            action,
            issued_at: Instant::now(),
        });
        Ok(id)
    }

    /// Apply a server position update.
    pub fn on_server_update(&mut self, player_no: PlayerNo, position: Position) -> ServerApply {
        if player_no != self.local_player {
            return ServerApply::Remote;
        }
        if self.last_sent_position == Some(position) {
            // Echoed self-update; ignoring it keeps the in-flight prediction
            // from jittering.
            return ServerApply::LocalEcho;
        }
        self.confirmed_position = position;
        self.predicted_position = position;
        self.pending
            .retain(|p| p.action.category() != ActionCategory::Movement);
        ServerApply::LocalCorrection
    }

    /// Server confirmed a specific action.
    pub fn on_confirmed(&mut self, id: Uuid) -> bool {
        let Some(index) = self.pending.iter().position(|p| p.id == id) else {
            return false;
        };
        let pending = self.pending.remove(index);
        if let LocalAction::Move(position) = pending.action {
            self.confirmed_position = position;
        }
        true
    }

    /// Server rejected an action: discard it and roll the optimistic state
    /// back to the last confirmed value. Latches stay set; only the phase
    /// transition resets them.
    pub fn on_rejected(&mut self, id: Uuid) -> Option<LocalAction> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        let pending = self.pending.remove(index);
        if pending.action.category() == ActionCategory::Movement {
            self.predicted_position = self.confirmed_position;
        }
        Some(pending.action)
    }

    /// Discard predictions whose confirmation window elapsed.
    pub fn expire(&mut self, now: Instant) -> Vec<PendingAction> {
        let timeout = self.confirm_timeout;
        let (expired, live) = self
            .pending
            .drain(..)
            .partition(|p| now.duration_since(p.issued_at) >= timeout);
        self.pending = live;
        expired
    }

    /// Discard every in-flight prediction (the owning view was torn down
    /// before confirmation; discarded, not rolled back visually).
    pub fn cancel_pending(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Reset the one-shot latch that belongs to the phase being entered.
    pub fn on_phase_entered(&mut self, phase: Phase) {
        match phase {
            Phase::NightAction => self.skill_used = false,
            Phase::DayVote | Phase::DayFinalVote => self.has_voted = false,
            _ => {}
        }
    }

    pub fn local_player(&self) -> PlayerNo {
        self.local_player
    }

    pub fn predicted_position(&self) -> Position {
        self.predicted_position
    }

    pub fn confirmed_position(&self) -> Position {
        self.confirmed_position
    }

    pub fn skill_used(&self) -> bool {
        self.skill_used
    }

    pub fn has_voted(&self) -> bool {
        self.has_voted
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
