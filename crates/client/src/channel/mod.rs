//! Connection channel: topic pub/sub over one persistent websocket.

mod socket;
mod state;

pub use socket::Channel;
pub use state::{ConnectionState, ConnectionStateObserver};
