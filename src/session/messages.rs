//! Message contract between the coordinator and the decode worker
//!
//! Each channel carries one closed enum. Ownership of frames and payloads
//! moves with the message; nothing is shared across the thread boundary.

use std::fmt;
use std::time::Duration;

use crate::models::{Frame, Payload, ScanRect};

/// Identifier of one decode request within a session
///
/// Issued in increasing order by the coordinator and echoed back with the
/// outcome, so an outcome can be matched against the request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw sequence number
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One frame-decode job, consumed exactly once by the worker
#[derive(Debug)]
pub struct DecodeRequest {
    /// Sequence number echoed in the outcome
    pub id: RequestId,
    /// Raw frame, owned by the worker from now on
    pub frame: Frame,
    /// Region to search, in sensor coordinates
    pub rect: ScanRect,
}

/// Result of attempting to decode one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A symbol was found
    Success(Payload),
    /// Nothing found, or the frame/decoder failed; retried with the next frame
    Failure,
}

impl DecodeOutcome {
    /// True for `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Success(_))
    }
}

/// Messages accepted by the decode worker
#[derive(Debug)]
pub enum WorkerMessage {
    /// Decode a frame
    Decode(DecodeRequest),
    /// Stop the worker; anything queued behind this is never processed
    Quit,
}

/// Messages accepted by the session coordinator
#[derive(Debug)]
pub enum CoordinatorMessage {
    /// The camera produced the frame asked for
    FrameAvailable(Frame),
    /// The worker finished a request
    Outcome {
        /// Request the outcome belongs to
        request: RequestId,
        /// What the decoder found
        outcome: DecodeOutcome,
    },
    /// Re-scan after a success, optionally delayed
    Restart {
        /// Time to wait before previewing again
        delay: Duration,
    },
    /// End the session
    Quit,
}
