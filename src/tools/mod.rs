//! Host-side helpers: frames from image files and a replaying camera
//!
//! Useful for desktop hosts, benchmarks and tests that have no real camera.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, GrayImage};
use rayon::prelude::*;
use tracing::debug;

use crate::models::{Frame, LumaImage, ScanRect};
use crate::session::{CameraSource, FrameCallback};

fn max_dim_from_env() -> Option<u32> {
    match env::var("ZSCAN_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image file as a `Luma8` frame
///
/// Images larger than `ZSCAN_MAX_DIM` on their longest side are downscaled
/// first.
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame, image::ImageError> {
    let img = image::open(path)?;
    let (width, height) = img.dimensions();
    let img = match max_dim_from_env() {
        Some(max_dim) if width.max(height) > max_dim => {
            img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    Ok(frame_from_image(&img))
}

/// Convert a decoded image into a `Luma8` frame
pub fn frame_from_image(img: &DynamicImage) -> Frame {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    Frame::luma(gray.into_raw(), width as usize, height as usize)
}

/// Copy a luminance image into an `image` buffer, e.g. to save it for inspection
pub fn image_from_luma(luma: &LumaImage) -> Option<GrayImage> {
    GrayImage::from_raw(
        luma.width() as u32,
        luma.height() as u32,
        luma.as_bytes().to_vec(),
    )
}

/// Image files under `root`, recursively, in sorted order
pub fn image_paths<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut stack = vec![root.as_ref().to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "bmp") {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}

/// Camera that replays a fixed list of frames
///
/// Each `request_frame` delivers the next frame synchronously while the
/// preview is running. With `repeat` set the list loops; otherwise requests
/// past the end go unanswered.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    frames: Vec<Frame>,
    cursor: usize,
    repeat: bool,
    rect: Option<ScanRect>,
    previewing: bool,
    served: usize,
}

impl ReplayCamera {
    /// Replay `frames` once, searching the whole frame
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            cursor: 0,
            repeat: false,
            rect: None,
            previewing: false,
            served: 0,
        }
    }

    /// Load every image under `root` as a frame, in path order
    ///
    /// Files are decoded in parallel on the rayon pool.
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<Self, image::ImageError> {
        let frames = image_paths(root)
            .into_par_iter()
            .map(load_frame)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(frames = frames.len(), "replay camera loaded");
        Ok(Self::new(frames))
    }

    /// Loop over the frames forever
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Report `rect` as the framing rect instead of the full frame
    pub fn with_framing_rect(mut self, rect: ScanRect) -> Self {
        self.rect = Some(rect);
        self
    }

    /// Frames delivered so far
    pub fn frames_served(&self) -> usize {
        self.served
    }

    /// True while the preview is running
    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        if self.cursor >= self.frames.len() {
            if !self.repeat {
                return None;
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Some(frame)
    }
}

impl CameraSource for ReplayCamera {
    fn start_preview(&mut self) {
        self.previewing = true;
    }

    fn stop_preview(&mut self) {
        self.previewing = false;
    }

    fn request_frame(&mut self, callback: FrameCallback) {
        if !self.previewing {
            return;
        }
        match self.next_frame() {
            Some(frame) => {
                if callback.deliver(frame) {
                    self.served += 1;
                }
            }
            None => debug!(served = self.served, "replay camera out of frames"),
        }
    }

    fn framing_rect(&self) -> ScanRect {
        if let Some(rect) = self.rect {
            return rect;
        }
        self.frames
            .first()
            .map(|frame| ScanRect::full(frame.width, frame.height))
            .unwrap_or_default()
    }
}
