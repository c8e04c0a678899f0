//! The game session: root orchestrator of one joined room.
//!
//! Owns the channel subscriptions, the room mirror, the phase machine, the
//! scene dispatcher and the reconciler, and is the single writer of all of
//! them. Topic handlers run on the channel task and only forward typed
//! events into the session's inbound queue; every state mutation happens on
//! the session loop, in a fixed order per phase transition:
//!
//! 1. reconciler latches reset for the entered phase
//! 2. previous view torn down, next view initialized
//! 3. room snapshot updated
//! 4. `PhaseChanged` published on the bus
//!
//! So by the time presentation observes a transition, the views and
//! optimistic state are already consistent with it.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use outbreak_domain::{Phase, Player, PlayerNo, Position, Room, RoomId};
use outbreak_protocol::{normalize_value, topics, ChatType, ClientIntent, PhaseEvent, RoomEvent};

use crate::bus::EventBus;
use crate::channel::{Channel, ConnectionState};
use crate::config::ClientConfig;
use crate::dispatcher::{SceneDispatcher, ViewContext, ViewKind};
use crate::error::ClientError;
use crate::events::SessionEvent;
use crate::machine::PhaseMachine;
use crate::reconciler::{LocalAction, PredictError, Reconciler, ServerApply, SharedReconciler};
use crate::sync::lock;
use crate::views::{
    BallotView, DiscussionView, FinalStatementView, NightView, SharedRole,
};

/// Shared room mirror; the session writes, views and presentation read.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Typed events funneled from topic handlers onto the session loop.
#[derive(Debug)]
enum Inbound {
    Phase(PhaseEvent),
    Room(RoomEvent),
}

pub struct GameSession {
    channel: Channel,
    bus: EventBus<SessionEvent>,
    room: SharedRoom,
    machine: PhaseMachine,
    dispatcher: SceneDispatcher,
    reconciler: SharedReconciler,
    local_role: SharedRole,
    local_player: PlayerNo,
    room_id: RoomId,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    winner: Option<Option<outbreak_domain::Team>>,
}

impl GameSession {
    /// Connect, subscribe to every topic of the room, and announce entry.
    ///
    /// Subscriptions are installed before the enter intent is published, so
    /// no server reaction to our own entry can be missed. Handlers survive
    /// reconnects; the channel replays them itself.
    pub async fn join(
        config: &ClientConfig,
        room_id: RoomId,
        local_player: PlayerNo,
        nickname: impl Into<String>,
    ) -> Result<GameSession, ClientError> {
        let nickname = nickname.into();
        let channel = Channel::connect(config).await?;
        let bus: EventBus<SessionEvent> = EventBus::new();
        let room: SharedRoom = Arc::new(Mutex::new(Room::new(room_id, "")));
        let reconciler: SharedReconciler = Arc::new(Mutex::new(Reconciler::new(
            local_player,
            config.confirm_timeout(),
        )));
        let local_role: SharedRole = Arc::new(Mutex::new(None));

        let mut dispatcher = SceneDispatcher::new(ViewContext::new(
            bus.clone(),
            Arc::clone(&reconciler),
            Arc::clone(&room),
        ));
        dispatcher.register(ViewKind::Discussion, Box::new(DiscussionView::new()));
        dispatcher.register(ViewKind::Ballot, Box::new(BallotView::new()));
        dispatcher.register(ViewKind::FinalStatement, Box::new(FinalStatementView::new()));
        dispatcher.register(ViewKind::FinalBallot, Box::new(BallotView::new()));
        dispatcher.register(
            ViewKind::Night,
            Box::new(NightView::new(Arc::clone(&local_role))),
        );

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        // System topic: heterogeneous payloads, normalized by field presence.
        let tx = inbound_tx.clone();
        channel
            .subscribe(&topics::topic_system(room_id), move |payload| {
                if let Some(event) = normalize_value(payload) {
                    let _ = tx.send(Inbound::Phase(event));
                }
            })
            .await;

        // One chat topic per category; chat payloads normalize the same way.
        for chat_type in ChatType::ALL {
            let tx = inbound_tx.clone();
            channel
                .subscribe(&topics::topic_chat(room_id, chat_type), move |payload| {
                    if let Some(event) = normalize_value(payload) {
                        let _ = tx.send(Inbound::Phase(event));
                    }
                })
                .await;
        }

        // Room topic: tagged schema, plain serde.
        let tx = inbound_tx.clone();
        channel
            .subscribe(&topics::topic_room(room_id), move |payload| {
                match serde_json::from_value::<RoomEvent>(payload) {
                    Ok(event) => {
                        let _ = tx.send(Inbound::Room(event));
                    }
                    Err(err) => tracing::debug!(error = %err, "undecodable room event dropped"),
                }
            })
            .await;

        let state_bus = bus.clone();
        channel
            .set_on_state_change(move |state| {
                state_bus.dispatch(&SessionEvent::Connection(state));
            })
            .await;

        channel
            .publish(
                &topics::dest_room_enter(room_id),
                &ClientIntent::EnterRoom {
                    room_id,
                    player_no: local_player,
                    nickname,
                },
            )
            .await;
        tracing::info!(%room_id, %local_player, "joined room");

        Ok(GameSession {
            channel,
            bus,
            room,
            machine: PhaseMachine::new(),
            dispatcher,
            reconciler,
            local_role,
            local_player,
            room_id,
            inbound_rx,
            winner: None,
        })
    }

    /// Drive the session until game over or channel teardown.
    ///
    /// Consumes and returns the session so the final room snapshot and vote
    /// history remain inspectable after the loop ends.
    pub async fn run(mut self) -> GameSession {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                inbound = self.inbound_rx.recv() => {
                    match inbound {
                        Some(Inbound::Phase(event)) => {
                            if self.handle_phase_event(event) {
                                break;
                            }
                        }
                        Some(Inbound::Room(event)) => self.handle_room_event(event),
                        None => break,
                    }
                }
                _ = ticker.tick() => self.on_tick(),
            }
        }
        self
    }

    /// Returns true when the session reached its terminal state.
    fn handle_phase_event(&mut self, event: PhaseEvent) -> bool {
        match event {
            PhaseEvent::Phase {
                phase,
                remaining_seconds,
            } => self.apply_phase(phase, remaining_seconds),
            PhaseEvent::VoteResult { targets } => {
                self.bus.dispatch(&SessionEvent::VoteResult { targets });
            }
            PhaseEvent::Outcome { deaths, healed } => {
                lock(&self.room).apply_outcome(&deaths, healed);
                self.bus.dispatch(&SessionEvent::Outcome { deaths, healed });
                self.bus.dispatch(&SessionEvent::RoomChanged);
            }
            PhaseEvent::Chat(message) => {
                self.bus.dispatch(&SessionEvent::Chat(message));
            }
            PhaseEvent::GameOver { winner } => {
                if self.machine.finish() {
                    self.dispatcher.shutdown();
                    self.winner = Some(winner);
                    self.bus.dispatch(&SessionEvent::GameOver { winner });
                    tracing::info!(?winner, "game over");
                }
                return true;
            }
        }
        false
    }

    fn apply_phase(&mut self, phase: Phase, remaining_seconds: u32) {
        let transition = self.machine.apply_phase(phase, remaining_seconds);
        match transition {
            Some(transition) => {
                lock(&self.reconciler).on_phase_entered(transition.to);
                self.dispatcher.on_phase_changed(transition.to);
                lock(&self.room).set_phase(transition.to, remaining_seconds);
                self.bus.dispatch(&SessionEvent::PhaseChanged {
                    phase: transition.to,
                    remaining_seconds,
                });
                tracing::info!(from = ?transition.from, to = ?transition.to, "phase transition");
            }
            None => {
                // Repeat of the current phase: the machine already took the
                // corrected countdown; mirror it into the room snapshot.
                lock(&self.room).set_phase(phase, remaining_seconds);
            }
        }
    }

    fn handle_room_event(&mut self, event: RoomEvent) {
        let result = match event {
            RoomEvent::PlayerJoined {
                player_no,
                nickname,
            } => Player::new(player_no, nickname).and_then(|p| lock(&self.room).join(p)),
            RoomEvent::PlayerLeft { player_no } => {
                lock(&self.room).leave(player_no).map(|_| ())
            }
            RoomEvent::ReadyChanged { player_no, ready } => {
                lock(&self.room).set_ready(player_no, ready)
            }
            RoomEvent::HostChanged { player_no } => lock(&self.room).set_host(player_no),
            RoomEvent::RoleAssigned { player_no, role } => {
                if player_no == self.local_player {
                    *lock(&self.local_role) = Some(role);
                }
                lock(&self.room).reveal_role(player_no, role)
            }
            RoomEvent::PlayerMoved {
                player_no,
                position,
            } => {
                match lock(&self.reconciler).on_server_update(player_no, position) {
                    // Echo of our own last-sent coordinates; the prediction
                    // already shows them.
                    ServerApply::LocalEcho => return,
                    ServerApply::LocalCorrection | ServerApply::Remote => {
                        lock(&self.room).set_position(player_no, position);
                    }
                }
                Ok(())
            }
            RoomEvent::GameStarted => {
                tracing::info!(room_id = %self.room_id, "game started");
                Ok(())
            }
        };
        // The server may reference players we never saw join; the mirror
        // stays best-effort rather than failing the session.
        if let Err(err) = result {
            tracing::debug!(error = %err, "room event skipped");
            return;
        }
        self.bus.dispatch(&SessionEvent::RoomChanged);
    }

    fn on_tick(&mut self) {
        if self.machine.current().is_none() || self.machine.is_finished() {
            return;
        }
        let remaining = self.machine.tick();
        lock(&self.room).remaining_seconds = remaining;
        self.dispatcher.tick(remaining);
        for expired in lock(&self.reconciler).expire(Instant::now()) {
            tracing::warn!(action = ?expired.action, "action confirmation timed out");
            self.bus.dispatch(&SessionEvent::Rejected {
                reason: "confirmation timed out".to_string(),
            });
        }
    }

    // -----------------------------------------------------------------------
    // Player intents
    // -----------------------------------------------------------------------

    /// Predict the move locally and publish it.
    pub async fn send_move(&self, position: Position) {
        // Movement is never latched; predict cannot fail for it.
        let _ = lock(&self.reconciler).predict(LocalAction::Move(position));
        lock(&self.room).set_position(self.local_player, position);
        let intent = ClientIntent::Move {
            room_id: self.room_id,
            player_no: self.local_player,
            position,
        };
        self.channel.publish(&intent.destination(), &intent).await;
    }

    pub async fn send_chat(&self, chat_type: ChatType, content: impl Into<String>) {
        let intent = ClientIntent::Chat {
            room_id: self.room_id,
            player_no: self.local_player,
            chat_type,
            content: content.into(),
        };
        self.channel.publish(&intent.destination(), &intent).await;
    }

    /// Use the night skill on a target. One-shot per night phase: a repeat
    /// fails here and nothing reaches the network.
    pub async fn use_skill(&self, target: PlayerNo) -> Result<(), PredictError> {
        lock(&self.reconciler).predict(LocalAction::SkillTarget(target))?;
        let intent = ClientIntent::UseSkill {
            room_id: self.room_id,
            player_no: self.local_player,
            target,
        };
        self.channel.publish(&intent.destination(), &intent).await;
        Ok(())
    }

    /// Cast the day vote. One-shot per vote phase, checked before publishing.
    pub async fn cast_vote(&self, target: PlayerNo) -> Result<(), PredictError> {
        lock(&self.reconciler).predict(LocalAction::Vote(target))?;
        let intent = ClientIntent::CastVote {
            room_id: self.room_id,
            player_no: self.local_player,
            target,
        };
        self.channel.publish(&intent.destination(), &intent).await;
        Ok(())
    }

    pub async fn set_ready(&self, ready: bool) {
        let intent = ClientIntent::Ready {
            room_id: self.room_id,
            player_no: self.local_player,
            ready,
        };
        self.channel.publish(&intent.destination(), &intent).await;
    }

    pub async fn start_game(&self) -> Result<(), ClientError> {
        self.require_host("start the game")?;
        let intent = ClientIntent::StartGame {
            room_id: self.room_id,
            player_no: self.local_player,
        };
        self.channel.publish(&intent.destination(), &intent).await;
        Ok(())
    }

    pub async fn kick_player(&self, target: PlayerNo) -> Result<(), ClientError> {
        self.require_host("kick a player")?;
        let intent = ClientIntent::KickPlayer {
            room_id: self.room_id,
            player_no: self.local_player,
            target,
        };
        self.channel.publish(&intent.destination(), &intent).await;
        Ok(())
    }

    /// Announce leaving and close the channel.
    pub async fn leave(&self) {
        let intent = ClientIntent::LeaveRoom {
            room_id: self.room_id,
            player_no: self.local_player,
        };
        self.channel.publish(&intent.destination(), &intent).await;
        self.channel.disconnect().await;
    }

    fn require_host(&self, what: &'static str) -> Result<(), ClientError> {
        if lock(&self.room).host() == Some(self.local_player) {
            Ok(())
        } else {
            Err(ClientError::NotHost(what))
        }
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Clone of the current room mirror.
    pub fn snapshot(&self) -> Room {
        lock(&self.room).clone()
    }

    pub fn events(&self) -> EventBus<SessionEvent> {
        self.bus.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.machine.current()
    }

    pub fn active_view(&self) -> Option<ViewKind> {
        self.dispatcher.active()
    }

    pub fn local_role(&self) -> Option<outbreak_domain::Role> {
        *lock(&self.local_role)
    }

    pub fn winner(&self) -> Option<Option<outbreak_domain::Team>> {
        self.winner
    }

    pub fn reconciler(&self) -> SharedReconciler {
        Arc::clone(&self.reconciler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_domain::Role;

    // Session construction needs a live socket; loop-level behavior is
    // covered by the integration tests. These exercise the pure pieces.

    fn session_parts() -> (
        PhaseMachine,
        SceneDispatcher,
        SharedReconciler,
        SharedRoom,
        EventBus<SessionEvent>,
    ) {
        let bus: EventBus<SessionEvent> = EventBus::new();
        let room: SharedRoom = Arc::new(Mutex::new(Room::new(RoomId::new(1), "t")));
        let reconciler: SharedReconciler = Arc::new(Mutex::new(Reconciler::new(
            PlayerNo::new(1),
            std::time::Duration::from_secs(5),
        )));
        let role: SharedRole = Arc::new(Mutex::new(Some(Role::Infector)));
        let mut dispatcher = SceneDispatcher::new(ViewContext::new(
            bus.clone(),
            Arc::clone(&reconciler),
            Arc::clone(&room),
        ));
        dispatcher.register(ViewKind::Discussion, Box::new(DiscussionView::new()));
        dispatcher.register(ViewKind::Ballot, Box::new(BallotView::new()));
        dispatcher.register(ViewKind::FinalStatement, Box::new(FinalStatementView::new()));
        dispatcher.register(ViewKind::FinalBallot, Box::new(BallotView::new()));
        dispatcher.register(ViewKind::Night, Box::new(NightView::new(role)));
        (PhaseMachine::new(), dispatcher, reconciler, room, bus)
    }

    #[test]
    fn transition_order_resets_latches_before_views_attach() {
        let (mut machine, mut dispatcher, reconciler, _room, _bus) = session_parts();

        lock(&reconciler)
            .predict(LocalAction::Vote(PlayerNo::new(2)))
            .expect("vote");
        assert!(lock(&reconciler).has_voted());

        // Mirror of the session's per-transition sequence.
        let transition = machine.apply_phase(Phase::DayVote, 30).expect("transition");
        lock(&reconciler).on_phase_entered(transition.to);
        dispatcher.on_phase_changed(transition.to);

        assert!(!lock(&reconciler).has_voted());
        assert_eq!(dispatcher.active(), Some(ViewKind::Ballot));
    }

    #[test]
    fn repeated_phase_never_reaches_the_dispatcher() {
        let (mut machine, mut dispatcher, _reconciler, _room, _bus) = session_parts();

        machine
            .apply_phase(Phase::NightAction, 60)
            .map(|t| dispatcher.on_phase_changed(t.to))
            .expect("first transition");
        let before = dispatcher.listener_count();

        assert!(machine.apply_phase(Phase::NightAction, 55).is_none());
        assert_eq!(dispatcher.listener_count(), before);
        assert_eq!(dispatcher.active(), Some(ViewKind::Night));
    }

    #[test]
    fn vote_phases_use_distinct_ballot_instances() {
        let (mut machine, mut dispatcher, _reconciler, _room, _bus) = session_parts();

        for (phase, expected) in [
            (Phase::DayVote, ViewKind::Ballot),
            (Phase::DayFinalStatement, ViewKind::FinalStatement),
            (Phase::DayFinalVote, ViewKind::FinalBallot),
        ] {
            let transition = machine.apply_phase(phase, 30).expect("transition");
            dispatcher.on_phase_changed(transition.to);
            assert_eq!(dispatcher.active(), Some(expected));
        }
    }
}
