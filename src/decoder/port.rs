use thiserror::Error;

use crate::models::{LumaImage, Payload, ScanRect};

/// Failure reported by a decoder backend
///
/// The decode worker treats every error as an ordinary miss and moves on to
/// the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// The backend rejected or failed on this frame
    #[error("decoder failed: {0}")]
    Failed(String),

    /// The backend cannot decode at all (e.g. native library missing)
    #[error("decoder backend unavailable")]
    Unavailable,
}

/// Symbol recognition capability used by the decode worker
///
/// Implementations receive an upright luminance image and the region to
/// search, and return the decoded payload or `None` when no symbol was found.
/// Calls are strictly sequential: the worker never overlaps two invocations,
/// so an implementation may keep internal caches between calls.
pub trait Decoder: Send {
    /// Attempt to decode one frame
    fn decode(
        &mut self,
        image: &LumaImage,
        rect: &ScanRect,
    ) -> Result<Option<Payload>, DecoderError>;
}

impl<F> Decoder for F
where
    F: FnMut(&LumaImage, &ScanRect) -> Option<Payload> + Send,
{
    fn decode(
        &mut self,
        image: &LumaImage,
        rect: &ScanRect,
    ) -> Result<Option<Payload>, DecoderError> {
        Ok(self(image, rect))
    }
}
