//! zscan - camera scan session core
//!
//! Drives a live barcode/QR scan: a coordinator owns the session state
//! machine, a dedicated worker thread decodes frames off the capture path, and
//! the two talk only through channels. Camera, decoder and UI live behind
//! narrow traits supplied by the host.
//!
//! ```no_run
//! use zscan::tools::ReplayCamera;
//! use zscan::{LumaImage, Payload, ResultSink, ScanRect, SessionConfig, SessionCoordinator,
//!     SessionError, SessionSinks};
//!
//! struct Print;
//!
//! impl ResultSink for Print {
//!     fn on_scan_success(&mut self, payload: &Payload) {
//!         println!("{payload}");
//!     }
//!
//!     fn on_startup_error(&mut self, error: &SessionError) {
//!         eprintln!("{error}");
//!     }
//! }
//!
//! let decoder = |_: &LumaImage, _: &ScanRect| -> Option<Payload> { None };
//! let camera = ReplayCamera::from_dir("frames").unwrap();
//! let mut session = SessionCoordinator::new(
//!     SessionConfig::from_env(),
//!     decoder,
//!     camera,
//!     SessionSinks::result_only(Print),
//! );
//! session.start().unwrap();
//! session.run();
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Session configuration and environment overrides
pub mod config;
/// Decoder port
pub mod decoder;
/// Error types
pub mod error;
/// Core data structures (Frame, LumaImage, ScanRect, Payload, etc.)
pub mod models;
/// Session coordinator, messages and collaborator traits
pub mod session;
/// Image-file and replay helpers for hosts without a camera
pub mod tools;
/// Frame processing (luminance, rotation, crop)
pub mod utils;
/// Inactivity watchdog
pub mod watchdog;
mod worker;

pub use config::SessionConfig;
pub use decoder::{Decoder, DecoderError};
pub use error::{FrameError, SessionError};
pub use models::{Frame, LumaImage, Payload, PixelFormat, Rotation, ScanRect};
pub use session::{
    CameraSource, DecodeOutcome, FeedbackSink, FrameCallback, ResultSink, SessionCoordinator,
    SessionHandle, SessionSinks, SessionState, SessionStats, ViewfinderSink,
};
pub use watchdog::{InactivityWatchdog, WatchdogControl};
