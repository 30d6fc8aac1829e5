//! Frame geometry transform
//!
//! Brings a raw sensor frame into the orientation the decoder expects and
//! maps the scan rect along with it. Every function here is pure and writes
//! into a freshly allocated buffer: the camera may recycle the input as soon
//! as the transform returns.

use crate::error::FrameError;
use crate::models::{Frame, LumaImage, Rotation, ScanRect};
use crate::utils::luma::luma_plane;

/// Decoder-ready image plus the scan rect in the same coordinate space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedFrame {
    /// Upright luminance image
    pub image: LumaImage,
    /// Scan rect mapped into `image` coordinates
    pub rect: ScanRect,
}

impl TransformedFrame {
    /// Fresh image holding only the scan rect
    pub fn cropped(&self) -> LumaImage {
        self.image.crop(&self.rect)
    }
}

/// Luminance extraction, rotation and rect mapping for one frame
///
/// The rect is given in sensor coordinates and clamped to the frame first.
///
/// # Errors
/// Fails when the frame buffer does not match its declared size and format.
pub fn transform_frame(frame: &Frame, rect: &ScanRect) -> Result<TransformedFrame, FrameError> {
    let plane = luma_plane(frame)?;
    let (width, height) = (frame.width, frame.height);
    let (out_width, out_height) = frame.rotation.rotated_dimensions(width, height);
    let data = rotate_plane(&plane, width, height, frame.rotation);

    Ok(TransformedFrame {
        image: LumaImage::from_raw(data, out_width, out_height)
            .unwrap_or_else(|| LumaImage::new(out_width, out_height)),
        rect: rotate_rect(rect, width, height, frame.rotation),
    })
}

/// Rotate a luminance image clockwise
pub fn rotate_luma(image: &LumaImage, rotation: Rotation) -> LumaImage {
    let (width, height) = rotation.rotated_dimensions(image.width(), image.height());
    let data = rotate_plane(image.as_bytes(), image.width(), image.height(), rotation);
    LumaImage::from_raw(data, width, height).unwrap_or_else(|| LumaImage::new(width, height))
}

/// Rotate the first `width * height` samples of a row-major plane clockwise
///
/// Quarter turns return a `height` x `width` plane. For `Cw90` the sample at
/// (x, y) lands at (height - 1 - y, x). Returns an empty plane when `src`
/// holds fewer than `width * height` samples.
pub fn rotate_plane(src: &[u8], width: usize, height: usize, rotation: Rotation) -> Vec<u8> {
    let pixel_count = match width.checked_mul(height) {
        Some(count) if count > 0 && count <= src.len() => count,
        _ => return Vec::new(),
    };
    let src = &src[..pixel_count];
    if rotation == Rotation::None {
        return src.to_vec();
    }

    let (out_width, _) = rotation.rotated_dimensions(width, height);
    let mut dst = vec![0u8; pixel_count];
    for (y, row) in dst.chunks_exact_mut(out_width).enumerate() {
        for (x, out) in row.iter_mut().enumerate() {
            *out = src[source_index(rotation, x, y, width, height)];
        }
    }
    dst
}

/// Index into the source plane for output pixel (x, y)
#[inline]
fn source_index(rotation: Rotation, x: usize, y: usize, width: usize, height: usize) -> usize {
    match rotation {
        Rotation::None => y * width + x,
        Rotation::Cw90 => (height - 1 - x) * width + y,
        Rotation::Cw180 => (height - 1 - y) * width + (width - 1 - x),
        Rotation::Cw270 => x * width + (width - 1 - y),
    }
}

/// Map a rect on a `width` x `height` frame into the rotated frame
///
/// The rect is clamped to the source frame before mapping.
pub fn rotate_rect(rect: &ScanRect, width: usize, height: usize, rotation: Rotation) -> ScanRect {
    let rect = rect.clamp_to(width, height);
    match rotation {
        Rotation::None => rect,
        Rotation::Cw90 => ScanRect::new(height - rect.bottom(), rect.left, rect.height, rect.width),
        Rotation::Cw180 => ScanRect::new(
            width - rect.right(),
            height - rect.bottom(),
            rect.width,
            rect.height,
        ),
        Rotation::Cw270 => ScanRect::new(rect.top, width - rect.right(), rect.height, rect.width),
    }
}
