//! Connection lifecycle state.
//!
//! State is stored in an atomic so observers can poll it from any context
//! without touching the channel's locks. Connection trouble is surfaced as a
//! transient indicator only - it is never fatal to application state.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected; no reconnect scheduled (initial or after disconnect).
    Disconnected,
    /// First connection attempt in progress.
    Connecting,
    /// Connected; frames flow.
    Connected,
    /// Connection lost; retrying on the fixed delay until disconnected.
    Reconnecting,
}

impl ConnectionState {
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Read-only view of the channel's connection state.
///
/// Clones share the same underlying atomic; the channel keeps it updated.
#[derive(Clone)]
pub struct ConnectionStateObserver {
    state: Arc<AtomicU8>,
}

impl ConnectionStateObserver {
    pub(crate) fn new(state: Arc<AtomicU8>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_atomic_storage() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
        ] {
            assert_eq!(ConnectionState::from_u8(state.to_u8()), state);
        }
    }

    #[test]
    fn observer_tracks_the_shared_atomic() {
        let state = Arc::new(AtomicU8::new(ConnectionState::Disconnected.to_u8()));
        let observer = ConnectionStateObserver::new(Arc::clone(&state));
        assert!(!observer.is_connected());
        state.store(ConnectionState::Connected.to_u8(), Ordering::SeqCst);
        assert!(observer.is_connected());
    }
}
