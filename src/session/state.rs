use std::fmt;

/// Lifecycle state of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SessionState {
    /// Created, not started
    #[default]
    Idle,
    /// Camera preview running, frames being decoded
    Previewing,
    /// A payload was delivered; waiting for restart or quit
    Success,
    /// Quit; worker joined. Terminal.
    Terminated,
}

impl SessionState {
    /// True once the session has been quit
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Previewing => "previewing",
            SessionState::Success => "success",
            SessionState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters kept by the coordinator over the life of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frame requests sent to the camera
    pub frames_requested: u64,
    /// Decode requests posted to the worker
    pub requests_issued: u64,
    /// Failure outcomes applied
    pub failures: u64,
    /// Success outcomes applied
    pub successes: u64,
    /// Outcomes discarded as stale
    pub stale_outcomes: u64,
    /// Frames dropped because the session was not ready for them
    pub frames_dropped: u64,
}
