//! Normalized overlay positions.
//!
//! Coordinates are normalized: `(0.0, 0.0)` is top-left and `(1.0, 1.0)` is
//! bottom-right of the frame. Overlay anchors are kept inside a safe band so
//! captions cannot be dragged off the canvas.

use serde::{Deserialize, Serialize};

use crate::frame::Dimensions;

/// Lowest allowed normalized coordinate for an overlay anchor.
pub const POSITION_MIN: f64 = 0.05;

/// Highest allowed normalized coordinate for an overlay anchor.
pub const POSITION_MAX: f64 = 0.95;

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    /// Default anchor for new overlays: centred, near the bottom.
    pub const CAPTION_DEFAULT: NormalizedPoint = NormalizedPoint { x: 0.5, y: 0.8 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into `[POSITION_MIN, POSITION_MAX]`.
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_coordinate(self.x),
            y: clamp_coordinate(self.y),
        }
    }

    /// Offset from `other` to `self`.
    pub fn offset_from(&self, other: &NormalizedPoint) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }

    /// Scale to pixel coordinates on a canvas of `dims`.
    pub fn to_pixels(&self, dims: Dimensions) -> (f32, f32) {
        (
            (self.x * dims.width as f64) as f32,
            (self.y * dims.height as f64) as f32,
        )
    }
}

impl Default for NormalizedPoint {
    fn default() -> Self {
        Self::CAPTION_DEFAULT
    }
}

/// Clamp one coordinate into the safe band. NaN resolves to the centre.
pub fn clamp_coordinate(value: f64) -> f64 {
    if value.is_nan() {
        return 0.5;
    }
    value.clamp(POSITION_MIN, POSITION_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_keeps_anchor_on_canvas() {
        let p = NormalizedPoint::new(-0.3, 1.4).clamped();
        assert_eq!(p, NormalizedPoint::new(POSITION_MIN, POSITION_MAX));

        let inside = NormalizedPoint::new(0.25, 0.75);
        assert_eq!(inside.clamped(), inside);
    }

    #[test]
    fn test_nan_resolves_to_centre() {
        assert_eq!(clamp_coordinate(f64::NAN), 0.5);
    }

    #[test]
    fn test_to_pixels() {
        let (x, y) = NormalizedPoint::new(0.5, 0.8).to_pixels(Dimensions::new(200, 100));
        assert!((x - 100.0).abs() < 1e-4);
        assert!((y - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_offset_from() {
        let a = NormalizedPoint::new(0.6, 0.4);
        let b = NormalizedPoint::new(0.5, 0.5);
        let (dx, dy) = a.offset_from(&b);
        assert!((dx - 0.1).abs() < 1e-9);
        assert!((dy + 0.1).abs() < 1e-9);
    }
}
