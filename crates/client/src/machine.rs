//! Phase state machine.
//!
//! Holds the current phase and remaining time, driven strictly by normalized
//! server events. The server is authoritative over elapsed time: the local
//! 1 Hz tick is advisory between updates and is corrected (not accumulated)
//! by every fresh phase event. Receiving the same phase again is a no-op
//! transition-wise - duplicate transitions are suppressed here, never
//! reported as errors.

use outbreak_domain::Phase;

/// One actual phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// `None` when leaving the uninitialized start state.
    pub from: Option<Phase>,
    pub to: Phase,
    pub remaining_seconds: u32,
}

/// The five-phase cycle plus an implicit uninitialized start state and a
/// terminal game-over state.
#[derive(Debug, Default)]
pub struct PhaseMachine {
    current: Option<Phase>,
    remaining_seconds: u32,
    finished: bool,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a server phase event.
    ///
    /// Returns the transition if the phase actually changed. An identical
    /// consecutive phase only corrects the countdown. After game over,
    /// nothing is accepted.
    pub fn apply_phase(&mut self, phase: Phase, remaining_seconds: u32) -> Option<Transition> {
        if self.finished {
            tracing::debug!(?phase, "phase event after game over ignored");
            return None;
        }
        if self.current == Some(phase) {
            self.remaining_seconds = remaining_seconds;
            return None;
        }
        let from = self.current;
        self.current = Some(phase);
        self.remaining_seconds = remaining_seconds;
        Some(Transition {
            from,
            to: phase,
            remaining_seconds,
        })
    }

    /// End the machine. Returns false if it was already finished.
    pub fn finish(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        true
    }

    /// Local 1 Hz countdown, floored at zero.
    pub fn tick(&mut self) -> u32 {
        if !self.finished {
            self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        }
        self.remaining_seconds
    }

    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
