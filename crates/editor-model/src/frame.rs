//! Decoded frames and the document that owns them.
//!
//! Frames are immutable once decoded. A [`Document`] shares them through an
//! `Arc` so the export workers can read pixels without copying while the
//! editor keeps previewing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Smallest delay a frame may have, in centiseconds (GIF units).
pub const MIN_FRAME_DELAY_CS: u16 = 2;

/// Smallest delay a frame may have, in milliseconds.
pub const MIN_FRAME_DELAY_MS: u32 = MIN_FRAME_DELAY_CS as u32 * 10;

/// Convert an encoded GIF delay (centiseconds) to milliseconds, applying
/// the floor that keeps zero-delay frames out of the timeline math.
pub fn delay_ms_from_centis(centis: u16) -> u32 {
    u32::from(centis.max(MIN_FRAME_DELAY_CS)) * 10
}

/// Pixel dimensions of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Byte length of an RGBA buffer of this size.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Errors building frames or documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame {index} has {actual} pixel bytes, expected {expected}")]
    PixelLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Frame at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: usize },

    #[error("Document has no frames")]
    Empty,
}

/// One still image of an animation plus its display delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: usize,
    delay_ms: u32,
    pixels: Vec<u8>,
    preview: Vec<u8>,
}

impl Frame {
    /// Build a frame. `pixels` must be straight RGBA sized to `dimensions`;
    /// `delay_ms` is raised to [`MIN_FRAME_DELAY_MS`].
    pub fn new(
        index: usize,
        delay_ms: u32,
        dimensions: Dimensions,
        pixels: Vec<u8>,
        preview: Vec<u8>,
    ) -> Result<Self, FrameError> {
        let expected = dimensions.rgba_len();
        if pixels.len() != expected {
            return Err(FrameError::PixelLength {
                index,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            index,
            delay_ms: delay_ms.max(MIN_FRAME_DELAY_MS),
            pixels,
            preview,
        })
    }

    /// Ordinal position in the animation (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Display duration in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Straight (non-premultiplied) RGBA pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Screen-displayable encoding (PNG) for previews.
    pub fn preview(&self) -> &[u8] {
        &self.preview
    }
}

/// A loaded GIF: frames, dimensions, and total duration.
#[derive(Debug, Clone)]
pub struct Document {
    frames: Arc<[Frame]>,
    dimensions: Dimensions,
    total_duration_ms: u64,
}

impl Document {
    pub fn new(frames: Vec<Frame>, dimensions: Dimensions) -> Result<Self, FrameError> {
        if frames.is_empty() {
            return Err(FrameError::Empty);
        }
        let expected = dimensions.rgba_len();
        for (position, frame) in frames.iter().enumerate() {
            if frame.index != position {
                return Err(FrameError::IndexMismatch {
                    position,
                    index: frame.index,
                });
            }
            if frame.pixels.len() != expected {
                return Err(FrameError::PixelLength {
                    index: frame.index,
                    expected,
                    actual: frame.pixels.len(),
                });
            }
        }

        let total_duration_ms = total_duration_ms(&frames);
        Ok(Self {
            frames: frames.into(),
            dimensions,
            total_duration_ms,
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Shared handle to the frames, for export workers.
    pub fn shared_frames(&self) -> Arc<[Frame]> {
        Arc::clone(&self.frames)
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Sum of all frame delays, in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }
}

/// Sum of the delays of `frames`, in milliseconds.
pub fn total_duration_ms(frames: &[Frame]) -> u64 {
    frames.iter().map(|f| u64::from(f.delay_ms)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize, delay_ms: u32) -> Frame {
        let dims = Dimensions::new(2, 2);
        Frame::new(index, delay_ms, dims, vec![0; dims.rgba_len()], Vec::new()).unwrap()
    }

    #[test]
    fn test_delay_floor_from_centis() {
        assert_eq!(delay_ms_from_centis(0), 20);
        assert_eq!(delay_ms_from_centis(1), 20);
        assert_eq!(delay_ms_from_centis(2), 20);
        assert_eq!(delay_ms_from_centis(15), 150);
    }

    #[test]
    fn test_frame_delay_floor() {
        assert_eq!(frame(0, 0).delay_ms(), MIN_FRAME_DELAY_MS);
        assert_eq!(frame(0, 90).delay_ms(), 90);
    }

    #[test]
    fn test_frame_rejects_wrong_pixel_length() {
        let err = Frame::new(3, 100, Dimensions::new(2, 2), vec![0; 15], Vec::new()).unwrap_err();
        assert_eq!(
            err,
            FrameError::PixelLength {
                index: 3,
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_document_total_duration() {
        let doc = Document::new(
            vec![frame(0, 100), frame(1, 150), frame(2, 200)],
            Dimensions::new(2, 2),
        )
        .unwrap();
        assert_eq!(doc.total_duration_ms(), 450);
        assert_eq!(doc.frame_count(), 3);
        assert_eq!(doc.frame(1).map(Frame::delay_ms), Some(150));
    }

    #[test]
    fn test_document_rejects_empty_and_out_of_order() {
        assert_eq!(
            Document::new(Vec::new(), Dimensions::new(2, 2)).unwrap_err(),
            FrameError::Empty
        );
        assert!(matches!(
            Document::new(vec![frame(1, 100)], Dimensions::new(2, 2)),
            Err(FrameError::IndexMismatch { .. })
        ));
    }
}
