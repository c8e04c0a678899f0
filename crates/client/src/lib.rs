//! Outbreak Client - the phase-synchronized scene coordinator.
//!
//! This crate is the logical core of the Outbreak game client. It listens to
//! the server-authoritative stream of phase and event messages and
//! deterministically drives which interactive view is active, while
//! reconciling locally-predicted state (movement, skill and vote targets)
//! against server corrections.
//!
//! Data flow, leaf to root:
//!
//! ```text
//! Channel -> normalize -> PhaseMachine -> SceneDispatcher -> EventBus -> presentation
//! presentation -> Reconciler -> Channel (publish)
//! ```
//!
//! Presentation (rendering, audio, styling) is out of scope; it consumes the
//! [`EventBus`] and room snapshots only.

pub mod bus;
pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod machine;
pub mod reconciler;
pub mod session;
pub mod views;

pub(crate) mod sync;

pub use bus::{EventBus, Subscription};
pub use channel::{Channel, ConnectionState, ConnectionStateObserver};
pub use config::ClientConfig;
pub use dispatcher::{PhaseView, SceneDispatcher, ViewContext, ViewKind};
pub use error::ClientError;
pub use events::SessionEvent;
pub use machine::{PhaseMachine, Transition};
pub use reconciler::{
    ActionCategory, LocalAction, PendingAction, PredictError, Reconciler, ServerApply,
    SharedReconciler,
};
pub use session::{GameSession, SharedRoom};
pub use views::{
    BallotResolution, BallotView, DiscussionView, FinalStatementView, NightView, SharedRole,
};
