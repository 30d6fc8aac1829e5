//! Frame processing helpers
//!
//! - Luminance extraction (Luma8/NV21 pass-through, RGB/RGBA conversion)
//! - Geometry transform (rotation, scan rect mapping, crop)

pub mod luma;
pub mod transform;
