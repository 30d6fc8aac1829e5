use std::fmt;

/// Sub-region of a frame the decoder should examine
///
/// Coordinates are in pixels of the frame the rect belongs to. The camera
/// collaborator supplies it in sensor coordinates; the geometry transform
/// maps it into the rotated space handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ScanRect {
    /// Left edge (inclusive)
    pub left: usize,
    /// Top edge (inclusive)
    pub top: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl ScanRect {
    /// Create a new scan rect
    pub fn new(left: usize, top: usize, width: usize, height: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect covering a whole `width` x `height` frame
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> usize {
        self.left.saturating_add(self.width)
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> usize {
        self.top.saturating_add(self.height)
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// True when the rect covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check whether pixel (x, y) lies inside the rect
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Intersect with a `width` x `height` frame
    ///
    /// A rect lying completely outside the frame collapses to an empty rect
    /// anchored at the clamped corner.
    pub fn clamp_to(&self, width: usize, height: usize) -> Self {
        let left = self.left.min(width);
        let top = self.top.min(height);
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);
        Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

impl fmt::Display for ScanRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Clockwise rotation the sensor image needs to reach decoder orientation
///
/// Phone sensors are mounted landscape, so portrait capture delivers frames
/// that need a quarter turn before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Rotation {
    /// Frame is already upright
    #[default]
    None,
    /// Quarter turn clockwise
    Cw90,
    /// Half turn
    Cw180,
    /// Three quarter turns clockwise (quarter turn counter-clockwise)
    Cw270,
}

impl Rotation {
    /// Rotation from a clockwise angle in degrees; only multiples of 90 are valid
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Cw90),
            180 => Some(Rotation::Cw180),
            270 => Some(Rotation::Cw270),
            _ => None,
        }
    }

    /// Clockwise angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// Rotation that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            Rotation::None => Rotation::None,
            Rotation::Cw90 => Rotation::Cw270,
            Rotation::Cw180 => Rotation::Cw180,
            Rotation::Cw270 => Rotation::Cw90,
        }
    }

    /// Quarter turns transpose width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }

    /// Dimensions of a `width` x `height` image after rotation
    pub fn rotated_dimensions(&self, width: usize, height: usize) -> (usize, usize) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_frame_is_identity() {
        let rect = ScanRect::new(10, 20, 30, 40);
        assert_eq!(rect.clamp_to(100, 100), rect);
    }

    #[test]
    fn test_clamp_overhanging_rect() {
        let rect = ScanRect::new(80, 90, 50, 50);
        assert_eq!(rect.clamp_to(100, 100), ScanRect::new(80, 90, 20, 10));
    }

    #[test]
    fn test_clamp_outside_frame_is_empty() {
        let rect = ScanRect::new(200, 5, 10, 10).clamp_to(100, 100);
        assert!(rect.is_empty());
        assert_eq!(rect.left, 100);
    }

    #[test]
    fn test_contains() {
        let rect = ScanRect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 3));
        assert!(!rect.contains(2, 8));
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Cw90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Cw270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Cw90));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Cw180.degrees(), 180);
    }

    #[test]
    fn test_rotation_inverse() {
        for rotation in [
            Rotation::None,
            Rotation::Cw90,
            Rotation::Cw180,
            Rotation::Cw270,
        ] {
            let total = (rotation.degrees() + rotation.inverse().degrees()) % 360;
            assert_eq!(total, 0, "{rotation} does not cancel its inverse");
        }
    }

    #[test]
    fn test_rotated_dimensions() {
        assert_eq!(Rotation::Cw90.rotated_dimensions(640, 480), (480, 640));
        assert_eq!(Rotation::Cw180.rotated_dimensions(640, 480), (640, 480));
    }
}
