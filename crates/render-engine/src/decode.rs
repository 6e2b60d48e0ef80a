//! GIF decoding into a [`Document`].
//!
//! Every frame is composited onto the logical screen, so each decoded frame
//! is a full-size RGBA image regardless of how the encoder packed it.
//! Disposal methods are honoured between frames and transparent pixels
//! leave the underlying canvas visible.

use std::io::Cursor;

use addtextgif_common::error::DecodeError;
use addtextgif_editor_model::frame::{delay_ms_from_centis, Dimensions, Document, Frame};
use gif::{ColorOutput, DecodeOptions, DisposalMethod};

const GIF87A: &[u8] = b"GIF87a";
const GIF89A: &[u8] = b"GIF89a";

/// Decode GIF bytes off the async runtime.
pub async fn decode(bytes: Vec<u8>) -> Result<Document, DecodeError> {
    tokio::task::spawn_blocking(move || decode_blocking(&bytes))
        .await
        .map_err(|e| DecodeError::malformed(format!("decoder task failed: {e}")))?
}

/// Whether `bytes` starts with a GIF signature.
pub fn has_gif_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(GIF89A) || bytes.starts_with(GIF87A)
}

/// Decode GIF bytes on the current thread.
pub fn decode_blocking(bytes: &[u8]) -> Result<Document, DecodeError> {
    if !has_gif_signature(bytes) {
        return Err(DecodeError::Signature);
    }

    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);
    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| DecodeError::malformed(e.to_string()))?;

    let dims = Dimensions::new(u32::from(decoder.width()), u32::from(decoder.height()));
    if dims.is_empty() {
        return Err(DecodeError::ZeroDimensions);
    }

    let mut screen = LogicalScreen::new(dims);
    let mut frames = Vec::new();

    while let Some(raw) = decoder
        .read_next_frame()
        .map_err(|e| DecodeError::malformed(e.to_string()))?
    {
        let rect = FrameRect {
            left: u32::from(raw.left),
            top: u32::from(raw.top),
            width: u32::from(raw.width),
            height: u32::from(raw.height),
        };
        let saved = (raw.dispose == DisposalMethod::Previous).then(|| screen.pixels.clone());

        screen.draw(rect, &raw.buffer);
        let pixels = screen.pixels.clone();
        let preview = encode_preview(&pixels, dims)?;
        let index = frames.len();
        let frame = Frame::new(index, delay_ms_from_centis(raw.delay), dims, pixels, preview)
            .map_err(|e| DecodeError::malformed(e.to_string()))?;
        frames.push(frame);

        match raw.dispose {
            DisposalMethod::Background => screen.clear(rect),
            DisposalMethod::Previous => {
                if let Some(saved) = saved {
                    screen.pixels = saved;
                }
            }
            _ => {}
        }
    }

    if frames.is_empty() {
        return Err(DecodeError::NoFrames);
    }

    let document =
        Document::new(frames, dims).map_err(|e| DecodeError::malformed(e.to_string()))?;
    tracing::info!(
        frames = document.frame_count(),
        width = dims.width,
        height = dims.height,
        total_ms = document.total_duration_ms(),
        "Decoded GIF"
    );
    Ok(document)
}

#[derive(Debug, Clone, Copy)]
struct FrameRect {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

/// The full-size canvas frames are composited onto.
struct LogicalScreen {
    dims: Dimensions,
    pixels: Vec<u8>,
}

impl LogicalScreen {
    fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            pixels: vec![0; dims.rgba_len()],
        }
    }

    /// Copy the opaque pixels of a sub-image onto the screen. Parts outside
    /// the screen are clipped.
    fn draw(&mut self, rect: FrameRect, buffer: &[u8]) {
        for row in 0..rect.height {
            let dst_y = rect.top + row;
            if dst_y >= self.dims.height {
                break;
            }
            for col in 0..rect.width {
                let dst_x = rect.left + col;
                if dst_x >= self.dims.width {
                    break;
                }
                let src = (row as usize * rect.width as usize + col as usize) * 4;
                let Some(px) = buffer.get(src..src + 4) else {
                    return;
                };
                if px[3] == 0 {
                    continue;
                }
                let dst = (dst_y as usize * self.dims.width as usize + dst_x as usize) * 4;
                self.pixels[dst..dst + 4].copy_from_slice(px);
            }
        }
    }

    /// Restore a region to transparent.
    fn clear(&mut self, rect: FrameRect) {
        let right = (rect.left + rect.width).min(self.dims.width);
        let bottom = (rect.top + rect.height).min(self.dims.height);
        for y in rect.top..bottom {
            let row = y as usize * self.dims.width as usize;
            let start = (row + rect.left as usize) * 4;
            let end = (row + right as usize) * 4;
            if start < end {
                self.pixels[start..end].fill(0);
            }
        }
    }
}

/// Encode straight RGBA pixels as PNG bytes.
pub fn encode_preview(pixels: &[u8], dims: Dimensions) -> Result<Vec<u8>, DecodeError> {
    let image = image::RgbaImage::from_raw(dims.width, dims.height, pixels.to_vec())
        .ok_or_else(|| DecodeError::malformed("frame buffer does not match dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| DecodeError::malformed(format!("preview encoding failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode solid-colour frames with the given delays (centiseconds).
    fn solid_gif(width: u16, height: u16, frames: &[([u8; 4], u16)]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut out, width, height, &[]).unwrap();
            encoder.set_repeat(gif::Repeat::Infinite).unwrap();
            for (color, delay) in frames {
                let mut rgba: Vec<u8> = color
                    .iter()
                    .copied()
                    .cycle()
                    .take(width as usize * height as usize * 4)
                    .collect();
                let mut frame = gif::Frame::from_rgba_speed(width, height, &mut rgba, 10);
                frame.delay = *delay;
                encoder.write_frame(&frame).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_decodes_delays_and_total() {
        let bytes = solid_gif(
            4,
            3,
            &[
                ([255, 0, 0, 255], 10),
                ([0, 255, 0, 255], 15),
                ([0, 0, 255, 255], 20),
            ],
        );
        let doc = decode_blocking(&bytes).unwrap();
        assert_eq!(doc.dimensions(), Dimensions::new(4, 3));
        assert_eq!(doc.frame_count(), 3);
        let delays: Vec<u32> = doc.frames().iter().map(Frame::delay_ms).collect();
        assert_eq!(delays, vec![100, 150, 200]);
        assert_eq!(doc.total_duration_ms(), 450);

        let first = doc.frame(0).unwrap();
        assert_eq!(&first.pixels()[..4], &[255, 0, 0, 255]);
        assert!(first.preview().starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_zero_delay_is_floored() {
        let bytes = solid_gif(2, 2, &[([9, 9, 9, 255], 0), ([9, 9, 9, 255], 1)]);
        let doc = decode_blocking(&bytes).unwrap();
        assert!(doc.frames().iter().all(|f| f.delay_ms() == 20));
        assert_eq!(doc.total_duration_ms(), 40);
    }

    #[test]
    fn test_rejects_non_gif_bytes() {
        assert_eq!(decode_blocking(b"not a gif").unwrap_err(), DecodeError::Signature);
        assert_eq!(decode_blocking(&[]).unwrap_err(), DecodeError::Signature);
        let png = encode_preview(&[0, 0, 0, 255], Dimensions::new(1, 1)).unwrap();
        assert_eq!(decode_blocking(&png).unwrap_err(), DecodeError::Signature);
    }

    #[test]
    fn test_truncated_gif_is_malformed() {
        let bytes = solid_gif(4, 4, &[([1, 2, 3, 255], 10)]);
        let err = decode_blocking(&bytes[..14]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. } | DecodeError::NoFrames));
    }

    #[test]
    fn test_gif_without_frames() {
        let bytes = solid_gif(3, 3, &[]);
        let err = decode_blocking(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::NoFrames | DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_transparent_pixels_keep_previous_canvas() {
        let mut screen = LogicalScreen::new(Dimensions::new(2, 1));
        let full = FrameRect {
            left: 0,
            top: 0,
            width: 2,
            height: 1,
        };
        screen.draw(full, &[10, 10, 10, 255, 20, 20, 20, 255]);
        screen.draw(full, &[0, 0, 0, 0, 99, 99, 99, 255]);
        assert_eq!(screen.pixels, vec![10, 10, 10, 255, 99, 99, 99, 255]);

        screen.clear(FrameRect {
            left: 1,
            top: 0,
            width: 5,
            height: 5,
        });
        assert_eq!(screen.pixels, vec![10, 10, 10, 255, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_async_decode() {
        let bytes = solid_gif(2, 2, &[([0, 0, 0, 255], 5)]);
        let doc = decode(bytes).await.unwrap();
        assert_eq!(doc.total_duration_ms(), 50);
    }
}
