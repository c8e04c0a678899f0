//! Default interactive views, one per phase slot.
//!
//! These are the headless cores of the five scenes: they hold the state the
//! rendering layer binds to (transcripts, tallies, resolutions, night-action
//! prompts) and nothing visual. The night view is a single component
//! parameterized by the local player's role spec - role differences live in
//! the domain's role table, not in per-role view types.

use std::sync::{Arc, Mutex};

use outbreak_domain::{NightAction, PlayerNo, Role, VoteTally};
use outbreak_protocol::ChatMessage;

use crate::dispatcher::{PhaseView, ViewContext};
use crate::events::SessionEvent;
use crate::sync::lock;

/// Shared slot for the server-revealed local role; assigned mid-session.
pub type SharedRole = Arc<Mutex<Option<Role>>>;

// ---------------------------------------------------------------------------
// Discussion / final statement
// ---------------------------------------------------------------------------

/// Day discussion: collects the chat transcript while active.
#[derive(Default)]
pub struct DiscussionView {
    transcript: Arc<Mutex<Vec<ChatMessage>>>,
}

impl DiscussionView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        lock(&self.transcript).clone()
    }
}

impl PhaseView for DiscussionView {
    fn init(&mut self, ctx: &mut ViewContext) {
        lock(&self.transcript).clear();
        let transcript = Arc::clone(&self.transcript);
        ctx.listen(move |event| {
            if let SessionEvent::Chat(message) = event {
                lock(&transcript).push(message.clone());
            }
        });
    }

    fn update(&mut self, _ctx: &mut ViewContext, _remaining_seconds: u32) {}

    fn teardown(&mut self, _ctx: &mut ViewContext) {}
}

/// Final statement: the accused speaks; the view only tracks whether the
/// statement window has elapsed.
#[derive(Default)]
pub struct FinalStatementView {
    elapsed: bool,
}

impl FinalStatementView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statement_over(&self) -> bool {
        self.elapsed
    }
}

impl PhaseView for FinalStatementView {
    fn init(&mut self, _ctx: &mut ViewContext) {
        self.elapsed = false;
    }

    fn update(&mut self, _ctx: &mut ViewContext, remaining_seconds: u32) {
        if remaining_seconds == 0 {
            self.elapsed = true;
        }
    }

    fn teardown(&mut self, _ctx: &mut ViewContext) {}
}

// ---------------------------------------------------------------------------
// Ballot
// ---------------------------------------------------------------------------

/// How a ballot ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotResolution {
    Execute(PlayerNo),
    NoExecution,
}

#[derive(Default)]
struct BallotState {
    tally: VoteTally,
    resolution: Option<BallotResolution>,
}

/// Vote and final-vote phases: mirrors the server's vote result and resolves
/// the ballot. If the countdown reaches zero with no result from the server,
/// the view falls back to no-execution locally.
#[derive(Default)]
pub struct BallotView {
    state: Arc<Mutex<BallotState>>,
}

impl BallotView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> VoteTally {
        lock(&self.state).tally.clone()
    }

    pub fn resolution(&self) -> Option<BallotResolution> {
        lock(&self.state).resolution
    }
}

impl PhaseView for BallotView {
    fn init(&mut self, ctx: &mut ViewContext) {
        *lock(&self.state) = BallotState::default();
        let state = Arc::clone(&self.state);
        let room = Arc::clone(ctx.room());
        ctx.listen(move |event| {
            if let SessionEvent::VoteResult { targets } = event {
                let total_voters = lock(&room).alive_count();
                let tally = VoteTally::from_votes(targets.iter().copied());
                let resolution = match tally.execution_target(total_voters) {
                    Some(target) => BallotResolution::Execute(target),
                    None => BallotResolution::NoExecution,
                };
                let mut state = lock(&state);
                state.tally = tally;
                state.resolution = Some(resolution);
            }
        });
    }

    fn update(&mut self, _ctx: &mut ViewContext, remaining_seconds: u32) {
        if remaining_seconds == 0 {
            let mut state = lock(&self.state);
            if state.resolution.is_none() {
                // Local fail-safe, independent of server confirmation.
                state.resolution = Some(BallotResolution::NoExecution);
            }
        }
    }

    fn teardown(&mut self, _ctx: &mut ViewContext) {}
}

// ---------------------------------------------------------------------------
// Night
// ---------------------------------------------------------------------------

#[derive(Default)]
struct NightState {
    outcome: Option<(Vec<PlayerNo>, Option<PlayerNo>)>,
}

/// Night phase, parameterized by the local role's spec row.
///
/// Whether a target picker is shown at all, and which action it submits,
/// comes from the role table; there is one night view for all five roles.
pub struct NightView {
    role: SharedRole,
    active_action: Option<NightAction>,
    state: Arc<Mutex<NightState>>,
}

impl NightView {
    pub fn new(role: SharedRole) -> Self {
        Self {
            role,
            active_action: None,
            state: Arc::new(Mutex::new(NightState::default())),
        }
    }

    /// The night action available this phase, if the local role has one.
    pub fn action(&self) -> Option<NightAction> {
        self.active_action
    }

    pub fn outcome(&self) -> Option<(Vec<PlayerNo>, Option<PlayerNo>)> {
        lock(&self.state).outcome.clone()
    }
}

impl PhaseView for NightView {
    fn init(&mut self, ctx: &mut ViewContext) {
        self.active_action = lock(&self.role).and_then(Role::night_action);
        *lock(&self.state) = NightState::default();
        let state = Arc::clone(&self.state);
        ctx.listen(move |event| {
            if let SessionEvent::Outcome { deaths, healed } = event {
                lock(&state).outcome = Some((deaths.clone(), *healed));
            }
        });
    }

    fn update(&mut self, _ctx: &mut ViewContext, _remaining_seconds: u32) {}

    fn teardown(&mut self, _ctx: &mut ViewContext) {}
}
