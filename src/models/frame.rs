use std::fmt;

use super::{Rotation, ScanRect};
use crate::error::FrameError;

/// Sample layout of a raw sensor frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum PixelFormat {
    /// One 8-bit luminance sample per pixel
    #[default]
    Luma8,
    /// YUV 4:2:0 with the full-resolution Y plane first, then interleaved VU
    /// (the default preview format of mobile camera stacks)
    Nv21,
    /// Packed 8-bit RGB (3 bytes per pixel)
    Rgb8,
    /// Packed 8-bit RGBA (4 bytes per pixel, alpha ignored)
    Rgba8,
}

impl PixelFormat {
    /// Minimum buffer length for a `width` x `height` frame; `None` if it
    /// does not fit in `usize`
    pub fn required_len(&self, width: usize, height: usize) -> Option<usize> {
        let pixels = width.checked_mul(height)?;
        match self {
            PixelFormat::Luma8 => Some(pixels),
            PixelFormat::Nv21 => {
                let chroma = width.div_ceil(2).checked_mul(height.div_ceil(2))?;
                pixels.checked_add(chroma.checked_mul(2)?)
            }
            PixelFormat::Rgb8 => pixels.checked_mul(3),
            PixelFormat::Rgba8 => pixels.checked_mul(4),
        }
    }

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Luma8 => "luma8",
            PixelFormat::Nv21 => "nv21",
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Rgba8 => "rgba8",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One camera sample handed to the pipeline for a single decode attempt
///
/// The buffer is owned: once the frame is packaged into a decode request it
/// moves to the worker thread and the camera may recycle its own storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw samples, row-major
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Sample layout of `data`
    pub format: PixelFormat,
    /// Rotation needed to bring the frame upright for decoding
    pub rotation: Rotation,
}

impl Frame {
    /// Create an upright frame
    pub fn new(data: Vec<u8>, width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
            rotation: Rotation::None,
        }
    }

    /// Create an upright 8-bit luminance frame
    pub fn luma(data: Vec<u8>, width: usize, height: usize) -> Self {
        Self::new(data, width, height, PixelFormat::Luma8)
    }

    /// Set the rotation applied before decoding
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Check dimensions and buffer length against the pixel format
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        let Some(expected) = self.format.required_len(self.width, self.height) else {
            return Err(FrameError::TooLarge {
                format: self.format,
                width: self.width,
                height: self.height,
            });
        };
        if self.data.len() < expected {
            return Err(FrameError::BufferTooSmall {
                format: self.format,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Decoder-ready 8-bit luminance image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LumaImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl LumaImage {
    /// Create a black image of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Wrap an existing row-major buffer; `None` if the length does not match
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Option<Self> {
        if width.checked_mul(height) != Some(data.len()) {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Image width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get sample at (x, y); out-of-bounds reads return 0
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y * self.width + x]
    }

    /// Set sample at (x, y); out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[y * self.width + x] = value;
    }

    /// Raw samples
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the raw sample buffer
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Copy out the region covered by `rect` (clamped to the image)
    pub fn crop(&self, rect: &ScanRect) -> LumaImage {
        let rect = rect.clamp_to(self.width, self.height);
        let mut data = Vec::with_capacity(rect.area());
        for y in rect.top..rect.bottom() {
            let row_start = y * self.width;
            data.extend_from_slice(&self.data[row_start + rect.left..row_start + rect.right()]);
        }
        LumaImage {
            width: rect.width,
            height: rect.height,
            data,
        }
    }
}
