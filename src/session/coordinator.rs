use std::io;
use std::mem;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use super::handle::{FrameCallback, SessionHandle};
use super::messages::{CoordinatorMessage, DecodeOutcome, DecodeRequest, RequestId};
use super::sinks::{CameraSource, NoFeedback, SessionSinks};
use super::state::{SessionState, SessionStats};
use crate::config::SessionConfig;
use crate::decoder::Decoder;
use crate::error::SessionError;
use crate::models::{Frame, Payload};
use crate::watchdog::{InactivityWatchdog, WatchdogControl};
use crate::worker::DecodeWorker;

/// Owner of one scan session
///
/// The coordinator is the only writer of [`SessionState`]. It runs on the
/// host's thread, hands frames to a single decode worker and applies the
/// outcomes that come back through its inbox. Nothing here blocks on a
/// decode except [`SessionCoordinator::quit`], which joins the worker.
///
/// Messages from other threads (camera callbacks, [`SessionHandle`]s, the
/// worker) queue in the inbox and take effect when the host calls
/// [`pump`](SessionCoordinator::pump), [`pump_timeout`](SessionCoordinator::pump_timeout)
/// or [`run`](SessionCoordinator::run).
pub struct SessionCoordinator {
    config: SessionConfig,
    state: SessionState,
    decoder: Option<Box<dyn Decoder>>,
    worker: Option<DecodeWorker>,
    camera: Box<dyn CameraSource>,
    sinks: SessionSinks,
    inbox_tx: Sender<CoordinatorMessage>,
    inbox_rx: Receiver<CoordinatorMessage>,
    last_result: Option<Payload>,
    in_flight: Option<RequestId>,
    next_request: u64,
    pending_restart: Option<Instant>,
    preview_started: bool,
    stats: SessionStats,
}

impl SessionCoordinator {
    /// Create an idle session. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: SessionConfig,
        decoder: impl Decoder + 'static,
        camera: impl CameraSource + 'static,
        sinks: SessionSinks,
    ) -> Self {
        let (inbox_tx, inbox_rx) = crossbeam_channel::unbounded();
        Self {
            config,
            state: SessionState::Idle,
            decoder: Some(Box::new(decoder)),
            worker: None,
            camera: Box::new(camera),
            sinks,
            inbox_tx,
            inbox_rx,
            last_result: None,
            in_flight: None,
            next_request: 0,
            pending_restart: None,
            preview_started: false,
            stats: SessionStats::default(),
        }
    }

    /// Cloneable handle for posting messages from other threads
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.inbox_tx.clone())
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Payload of the last successful scan, until the next restart
    pub fn last_result(&self) -> Option<&Payload> {
        self.last_result.as_ref()
    }

    /// Counters for this session
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Configuration the session was built with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True while the decode thread is alive
    pub fn is_worker_running(&self) -> bool {
        self.worker.as_ref().is_some_and(DecodeWorker::is_running)
    }

    /// Spawn the decode worker and begin previewing
    ///
    /// # Errors
    /// `AlreadyStarted` or `Terminated` when called in the wrong state.
    /// `WorkerStart` when the decode thread cannot be spawned; the session is
    /// then terminated and the result sink has been told.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Terminated => return Err(SessionError::Terminated),
            SessionState::Previewing | SessionState::Success => {
                return Err(SessionError::AlreadyStarted);
            }
        }
        if self.worker.is_some() {
            return Err(SessionError::AlreadyStarted);
        }
        let Some(decoder) = self.decoder.take() else {
            return Err(SessionError::AlreadyStarted);
        };

        match DecodeWorker::spawn(decoder, self.inbox_tx.clone(), &self.config) {
            Ok(worker) => self.worker = Some(worker),
            Err(err) => {
                error!(error = %err, "scan session failed to start");
                self.state = SessionState::Terminated;
                self.sinks.result.on_startup_error(&err);
                return Err(err);
            }
        }

        self.state = SessionState::Previewing;
        info!(state = %self.state, "scan session started");
        self.camera.start_preview();
        self.preview_started = true;
        self.sinks.viewfinder.redraw_viewfinder();
        self.request_frame();
        Ok(())
    }

    /// Hand a camera frame to the worker
    ///
    /// Only accepted while previewing with no decode in flight; any other
    /// frame is dropped.
    pub fn on_frame_available(&mut self, frame: Frame) {
        if self.state != SessionState::Previewing || self.in_flight.is_some() {
            self.stats.frames_dropped += 1;
            debug!(state = %self.state, in_flight = self.in_flight.is_some(), "dropping frame");
            return;
        }
        let Some(worker) = self.worker.as_ref() else {
            self.stats.frames_dropped += 1;
            debug!("dropping frame, no decode worker");
            return;
        };

        self.next_request += 1;
        let id = RequestId::new(self.next_request);
        let request = DecodeRequest {
            id,
            frame,
            rect: self.camera.framing_rect(),
        };
        if worker.submit(request) {
            self.in_flight = Some(id);
            self.stats.requests_issued += 1;
        } else {
            self.stats.frames_dropped += 1;
            warn!(request = %id, "decode worker is gone, dropping frame");
        }
    }

    /// Apply a decode outcome
    ///
    /// Only applied while previewing. In any other state the outcome is stale
    /// and discarded.
    pub fn on_decode_outcome(&mut self, outcome: DecodeOutcome) {
        if self.state != SessionState::Previewing {
            self.discard_stale(None, self.state);
            return;
        }
        self.in_flight = None;
        self.sinks.feedback.on_activity();

        match outcome {
            DecodeOutcome::Failure => {
                self.stats.failures += 1;
                self.request_frame();
            }
            DecodeOutcome::Success(payload) => {
                self.stats.successes += 1;
                self.state = SessionState::Success;
                info!(state = %self.state, "scan succeeded");
                self.sinks.feedback.play_feedback();
                self.sinks.result.on_scan_success(&payload);
                self.last_result = Some(payload);
            }
        }
    }

    /// Re-scan after a success
    ///
    /// A zero delay resumes previewing immediately; otherwise the message
    /// pump resumes once `delay` has passed. The last result stays readable
    /// until previewing resumes. A delay too large to schedule never fires.
    /// Ignored outside `Success`.
    pub fn restart(&mut self, delay: Duration) {
        if self.state != SessionState::Success {
            debug!(state = %self.state, "ignoring restart");
            return;
        }
        if delay.is_zero() {
            self.resume_preview();
            return;
        }
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.pending_restart = Instant::now().checked_add(delay);
        match self.pending_restart {
            Some(_) => debug!(delay_ms, "restart scheduled"),
            None => debug!(delay_ms, "restart delay out of range, not scheduled"),
        }
    }

    /// [`restart`](Self::restart) with the configured default delay
    pub fn restart_default(&mut self) {
        self.restart(self.config.restart_delay);
    }

    /// End the session
    ///
    /// Stops the preview, stops and joins the decode worker (waiting for a
    /// decode in progress), then discards everything still queued. Calling it
    /// again does nothing.
    pub fn quit(&mut self) {
        if self.state.is_terminated() {
            return;
        }
        let previous = self.state;
        self.state = SessionState::Terminated;
        self.pending_restart = None;
        self.in_flight = None;

        if self.preview_started {
            self.camera.stop_preview();
            self.preview_started = false;
        }
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }

        while let Ok(message) = self.inbox_rx.try_recv() {
            match message {
                CoordinatorMessage::Outcome { .. } => self.stats.stale_outcomes += 1,
                CoordinatorMessage::FrameAvailable(_) => self.stats.frames_dropped += 1,
                CoordinatorMessage::Restart { .. } | CoordinatorMessage::Quit => {}
            }
        }
        info!(from = %previous, "scan session terminated");
    }

    /// Start an inactivity watchdog that quits this session after
    /// `config.idle_timeout` without decode activity
    ///
    /// The watchdog wraps the current feedback sink and is stopped when the
    /// coordinator is dropped. The returned control can pause it while the
    /// host is in the background.
    pub fn install_watchdog(&mut self) -> io::Result<WatchdogControl> {
        let watchdog = InactivityWatchdog::spawn(self.handle(), self.config.idle_timeout)?;
        let control = watchdog.control();
        let inner = mem::replace(&mut self.sinks.feedback, Box::new(NoFeedback));
        self.sinks.feedback = Box::new(watchdog.wrap(inner));
        Ok(control)
    }

    /// Dispatch every message already queued, without blocking
    ///
    /// Also performs a delayed restart whose deadline has passed. Returns the
    /// number of messages dispatched.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while let Ok(message) = self.inbox_rx.try_recv() {
            self.dispatch(message);
            count += 1;
        }
        self.fire_due_restart();
        count
    }

    /// Wait up to `timeout` for one message or a due delayed restart
    ///
    /// Returns `true` if anything was dispatched or resumed.
    pub fn pump_timeout(&mut self, timeout: Duration) -> bool {
        if self.fire_due_restart() {
            return true;
        }
        // An unrepresentable timeout means wait without limit.
        let deadline = match (Instant::now().checked_add(timeout), self.pending_restart) {
            (Some(timeout_at), Some(restart_at)) => Some(timeout_at.min(restart_at)),
            (timeout_at, restart_at) => timeout_at.or(restart_at),
        };
        let received = match deadline {
            Some(deadline) => self.inbox_rx.recv_deadline(deadline),
            None => self
                .inbox_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(message) => {
                self.dispatch(message);
                true
            }
            Err(RecvTimeoutError::Timeout) => self.fire_due_restart(),
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Dispatch messages until the session is terminated
    pub fn run(&mut self) {
        while !self.state.is_terminated() {
            let message = match self.pending_restart {
                Some(restart_at) => match self.inbox_rx.recv_deadline(restart_at) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => {
                        self.fire_due_restart();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.inbox_rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            self.dispatch(message);
        }
    }

    fn dispatch(&mut self, message: CoordinatorMessage) {
        match message {
            CoordinatorMessage::FrameAvailable(frame) => self.on_frame_available(frame),
            CoordinatorMessage::Outcome { request, outcome } => {
                if self.in_flight == Some(request) {
                    self.on_decode_outcome(outcome);
                } else {
                    self.discard_stale(Some(request), self.state);
                }
            }
            CoordinatorMessage::Restart { delay } => self.restart(delay),
            CoordinatorMessage::Quit => self.quit(),
        }
    }

    fn discard_stale(&mut self, request: Option<RequestId>, state: SessionState) {
        self.stats.stale_outcomes += 1;
        match request {
            Some(request) => debug!(request = %request, state = %state, "discarding stale outcome"),
            None => debug!(state = %state, "discarding stale outcome"),
        }
    }

    fn fire_due_restart(&mut self) -> bool {
        match self.pending_restart {
            Some(restart_at) if Instant::now() >= restart_at => {
                self.pending_restart = None;
                if self.state == SessionState::Success {
                    self.resume_preview();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn resume_preview(&mut self) {
        self.last_result = None;
        self.state = SessionState::Previewing;
        info!(state = %self.state, "scan restarted");
        self.sinks.viewfinder.redraw_viewfinder();
        self.request_frame();
    }

    fn request_frame(&mut self) {
        self.stats.frames_requested += 1;
        self.camera
            .request_frame(FrameCallback::new(self.inbox_tx.clone()));
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.quit();
    }
}
