//! Collaborator interfaces the coordinator drives
//!
//! The host implements these; the core never sees a UI or device type.
//! All calls are made from the coordinator's thread.

use super::handle::FrameCallback;
use crate::error::SessionError;
use crate::models::{Payload, ScanRect};

/// Camera preview and frame delivery
pub trait CameraSource: Send {
    /// Begin streaming preview to the screen
    fn start_preview(&mut self);

    /// Stop the preview stream
    fn stop_preview(&mut self);

    /// Deliver the next preview frame through `callback`, once
    ///
    /// May deliver synchronously from inside this call or later from another
    /// thread.
    fn request_frame(&mut self, callback: FrameCallback);

    /// Region of the sensor frame under the on-screen viewfinder
    fn framing_rect(&self) -> ScanRect;
}

/// Where decoded results and fatal startup errors go
pub trait ResultSink: Send {
    /// Called exactly once per transition into `Success`
    fn on_scan_success(&mut self, payload: &Payload);

    /// Called once if the decode worker could not be started
    fn on_startup_error(&mut self, error: &SessionError);
}

/// Fire-and-forget user feedback
pub trait FeedbackSink: Send {
    /// Activity ping; resets an inactivity watchdog
    fn on_activity(&mut self);

    /// Beep and/or vibrate after a successful scan
    fn play_feedback(&mut self);
}

/// Viewfinder overlay
pub trait ViewfinderSink: Send {
    /// Redraw the overlay (clears any previous result drawing)
    fn redraw_viewfinder(&mut self);
}

/// The three host capabilities injected into a coordinator
pub struct SessionSinks {
    /// Result delivery
    pub result: Box<dyn ResultSink>,
    /// Beep/vibrate and activity pings
    pub feedback: Box<dyn FeedbackSink>,
    /// Viewfinder redraws
    pub viewfinder: Box<dyn ViewfinderSink>,
}

impl SessionSinks {
    /// Bundle three sinks
    pub fn new(
        result: impl ResultSink + 'static,
        feedback: impl FeedbackSink + 'static,
        viewfinder: impl ViewfinderSink + 'static,
    ) -> Self {
        Self {
            result: Box::new(result),
            feedback: Box::new(feedback),
            viewfinder: Box::new(viewfinder),
        }
    }

    /// Result sink only; feedback and viewfinder calls are ignored
    pub fn result_only(result: impl ResultSink + 'static) -> Self {
        Self::new(result, NoFeedback, NoViewfinder)
    }
}

/// Feedback sink that ignores every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl FeedbackSink for NoFeedback {
    fn on_activity(&mut self) {}

    fn play_feedback(&mut self) {}
}

/// Viewfinder sink that ignores every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NoViewfinder;

impl ViewfinderSink for NoViewfinder {
    fn redraw_viewfinder(&mut self) {}
}
