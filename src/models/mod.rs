/// Frames, pixel formats and luminance images
pub mod frame;
/// Scan rectangles and rotations
pub mod geometry;
/// Decoded payload text
pub mod payload;

pub use frame::{Frame, LumaImage, PixelFormat};
pub use geometry::{Rotation, ScanRect};
pub use payload::Payload;
