//! Luminance extraction from raw sensor frames
//!
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
//!
//! Luma8 and NV21 frames already carry a full-resolution luminance plane and
//! are borrowed without copying; packed RGB/RGBA frames are converted.

use std::borrow::Cow;

use crate::error::FrameError;
use crate::models::{Frame, PixelFormat};

/// Coefficients for luminance conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn pixel_luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Luminance plane of a frame, `width * height` bytes, row-major
///
/// # Errors
/// Returns a [`FrameError`] when the frame has zero size or its buffer is
/// shorter than its pixel format requires.
pub fn luma_plane(frame: &Frame) -> Result<Cow<'_, [u8]>, FrameError> {
    frame.validate()?;
    let pixel_count = frame.width * frame.height;
    let plane = match frame.format {
        PixelFormat::Luma8 | PixelFormat::Nv21 => Cow::Borrowed(&frame.data[..pixel_count]),
        PixelFormat::Rgb8 => Cow::Owned(rgb_to_luma(&frame.data, frame.width, frame.height)),
        PixelFormat::Rgba8 => Cow::Owned(rgba_to_luma(&frame.data, frame.width, frame.height)),
    };
    Ok(plane)
}

/// Convert packed RGB to luminance
///
/// Converts at most `width * height` pixels; a short buffer yields a short plane.
pub fn rgb_to_luma(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    interleaved_to_luma(rgb, width.saturating_mul(height), 3)
}

/// Convert packed RGBA to luminance (ignores alpha channel)
pub fn rgba_to_luma(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    interleaved_to_luma(rgba, width.saturating_mul(height), 4)
}

fn interleaved_to_luma(src: &[u8], pixel_count: usize, channels: usize) -> Vec<u8> {
    src.chunks_exact(channels)
        .take(pixel_count)
        .map(|px| pixel_luma(px[0], px[1], px[2]))
        .collect()
}
