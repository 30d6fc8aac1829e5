use std::io;

use thiserror::Error;

use crate::models::PixelFormat;

/// Errors surfaced to the owner of a scan session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The decode thread could not be spawned. Fatal to the session.
    #[error("failed to start decode worker: {0}")]
    WorkerStart(#[source] io::Error),

    /// `start()` called on a session that is already running
    #[error("scan session already started")]
    AlreadyStarted,

    /// Operation on a session that has been quit
    #[error("scan session already terminated")]
    Terminated,
}

/// Problems with a raw frame; the worker turns these into decode failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Zero width or height
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame {
        /// Reported width
        width: usize,
        /// Reported height
        height: usize,
    },

    /// Buffer shorter than the pixel format requires
    #[error("{format} frame buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall {
        /// Declared layout
        format: PixelFormat,
        /// Minimum length for the declared size and layout
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Dimensions whose byte size overflows `usize`
    #[error("{format} frame too large ({width}x{height})")]
    TooLarge {
        /// Declared layout
        format: PixelFormat,
        /// Reported width
        width: usize,
        /// Reported height
        height: usize,
    },
}
