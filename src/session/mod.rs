//! Scan session: coordinator, message contract and host collaborators

/// Session state machine and message pump
pub mod coordinator;
/// Handles and frame callbacks usable from other threads
pub mod handle;
/// Messages exchanged between coordinator and worker
pub mod messages;
/// Host collaborator traits
pub mod sinks;
/// Session state and counters
pub mod state;

pub use coordinator::SessionCoordinator;
pub use handle::{FrameCallback, SessionHandle};
pub use messages::{DecodeOutcome, RequestId};
pub use sinks::{
    CameraSource, FeedbackSink, NoFeedback, NoViewfinder, ResultSink, SessionSinks,
    ViewfinderSink,
};
pub use state::{SessionState, SessionStats};
