//! Recording collaborators shared by the session integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use zscan::{
    CameraSource, FeedbackSink, Frame, FrameCallback, LumaImage, Payload, ResultSink, ScanRect,
    SessionConfig, SessionCoordinator, SessionError, SessionSinks, ViewfinderSink,
};

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Everything a session did to its collaborators, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartPreview,
    StopPreview,
    FrameRequested,
    Redraw,
    Activity,
    Feedback,
    Success(String),
    StartupError,
}

/// Shared event log
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn successes(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Success(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Camera that answers each request with a fresh 4x4 frame, or parks the
/// callback for the test to answer when `auto_deliver` is off
pub struct ScriptedCamera {
    log: EventLog,
    auto_deliver: bool,
    rect: ScanRect,
    parked: Arc<Mutex<Vec<FrameCallback>>>,
    next_value: u8,
}

impl ScriptedCamera {
    pub fn auto(log: EventLog) -> Self {
        Self {
            log,
            auto_deliver: true,
            rect: ScanRect::full(4, 4),
            parked: Arc::default(),
            next_value: 0,
        }
    }

    pub fn manual(log: EventLog) -> (Self, Arc<Mutex<Vec<FrameCallback>>>) {
        let camera = Self {
            auto_deliver: false,
            ..Self::auto(log)
        };
        let parked = camera.parked.clone();
        (camera, parked)
    }

    pub fn with_rect(mut self, rect: ScanRect) -> Self {
        self.rect = rect;
        self
    }
}

impl CameraSource for ScriptedCamera {
    fn start_preview(&mut self) {
        self.log.push(Event::StartPreview);
    }

    fn stop_preview(&mut self) {
        self.log.push(Event::StopPreview);
    }

    fn request_frame(&mut self, callback: FrameCallback) {
        self.log.push(Event::FrameRequested);
        if self.auto_deliver {
            self.next_value = self.next_value.wrapping_add(1);
            callback.deliver(Frame::luma(vec![self.next_value; 16], 4, 4));
        } else {
            self.parked.lock().unwrap().push(callback);
        }
    }

    fn framing_rect(&self) -> ScanRect {
        self.rect
    }
}

pub struct RecordingResults(pub EventLog);

impl ResultSink for RecordingResults {
    fn on_scan_success(&mut self, payload: &Payload) {
        self.0.push(Event::Success(payload.to_string()));
    }

    fn on_startup_error(&mut self, _error: &SessionError) {
        self.0.push(Event::StartupError);
    }
}

pub struct RecordingFeedback(pub EventLog);

impl FeedbackSink for RecordingFeedback {
    fn on_activity(&mut self) {
        self.0.push(Event::Activity);
    }

    fn play_feedback(&mut self) {
        self.0.push(Event::Feedback);
    }
}

pub struct RecordingViewfinder(pub EventLog);

impl ViewfinderSink for RecordingViewfinder {
    fn redraw_viewfinder(&mut self) {
        self.0.push(Event::Redraw);
    }
}

pub fn recording_sinks(log: &EventLog) -> SessionSinks {
    SessionSinks::new(
        RecordingResults(log.clone()),
        RecordingFeedback(log.clone()),
        RecordingViewfinder(log.clone()),
    )
}

/// Decoder answering from a script, one entry per call; misses once the
/// script runs out
pub fn scripted_decoder(
    script: &[Option<&str>],
) -> impl FnMut(&LumaImage, &ScanRect) -> Option<Payload> + Send + 'static {
    let mut script: VecDeque<Option<Payload>> =
        script.iter().map(|entry| entry.map(Payload::new)).collect();
    move |_: &LumaImage, _: &ScanRect| script.pop_front().flatten()
}

/// Session over an auto-delivering camera and recording sinks
pub fn scripted_session(
    config: SessionConfig,
    script: &[Option<&str>],
) -> (SessionCoordinator, EventLog) {
    init_tracing();
    let log = EventLog::default();
    let coordinator = SessionCoordinator::new(
        config,
        scripted_decoder(script),
        ScriptedCamera::auto(log.clone()),
        recording_sinks(&log),
    );
    (coordinator, log)
}

/// Pump one message at a time until `done` holds; panics after five seconds
pub fn pump_until(coordinator: &mut SessionCoordinator, done: impl Fn(&SessionCoordinator) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(coordinator) {
        assert!(Instant::now() < deadline, "timed out waiting for session");
        coordinator.pump_timeout(Duration::from_millis(20));
    }
}
