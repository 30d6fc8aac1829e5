use std::time::Duration;

use crossbeam_channel::Sender;

use super::messages::CoordinatorMessage;
use crate::models::Frame;

/// Cloneable, thread-safe way to reach a session's coordinator
///
/// Used by whatever lives outside the coordinator's thread: UI callbacks,
/// the inactivity watchdog, camera threads. Every method posts a message to
/// the coordinator inbox and returns `false` once the coordinator is gone.
/// Messages take effect when the coordinator pumps its inbox.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<CoordinatorMessage>,
}

impl SessionHandle {
    pub(crate) fn new(tx: Sender<CoordinatorMessage>) -> Self {
        Self { tx }
    }

    /// Ask for a re-scan after `delay`
    pub fn restart(&self, delay: Duration) -> bool {
        self.post(CoordinatorMessage::Restart { delay })
    }

    /// Ask the session to terminate
    pub fn quit(&self) -> bool {
        self.post(CoordinatorMessage::Quit)
    }

    /// Hand a camera frame to the session
    pub fn deliver_frame(&self, frame: Frame) -> bool {
        self.post(CoordinatorMessage::FrameAvailable(frame))
    }

    /// One-shot frame callback bound to this session
    pub fn frame_callback(&self) -> FrameCallback {
        FrameCallback {
            tx: self.tx.clone(),
        }
    }

    fn post(&self, message: CoordinatorMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// One-shot callback the camera uses to return a requested frame
///
/// Consumed by [`FrameCallback::deliver`]; dropping it without delivering
/// simply means no frame arrives for that request.
#[derive(Debug)]
pub struct FrameCallback {
    tx: Sender<CoordinatorMessage>,
}

impl FrameCallback {
    pub(crate) fn new(tx: Sender<CoordinatorMessage>) -> Self {
        Self { tx }
    }

    /// Post the frame to the coordinator; `false` if the session is gone
    pub fn deliver(self, frame: Frame) -> bool {
        self.tx
            .send(CoordinatorMessage::FrameAvailable(frame))
            .is_ok()
    }
}
