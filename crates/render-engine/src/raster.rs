//! Raster drawing for caption compositing.
//!
//! [`Canvas`] wraps a tiny-skia pixmap holding one frame. Frame pixels come
//! in and go out as straight RGBA; the pixmap itself is premultiplied.

use addtextgif_common::error::EncodeError;
use addtextgif_editor_model::color::{Color, Shadow};
use addtextgif_editor_model::frame::Dimensions;
use tiny_skia::{
    ColorU8, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8,
    Rect, Transform,
};

/// Cubic approximation constant for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Box-blur passes approximating a gaussian.
const BLUR_PASSES: usize = 3;

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Corner radius clamped to half the shorter side.
    pub fn clamp_radius(&self, radius: f32) -> f32 {
        radius.min(self.width / 2.0).min(self.height / 2.0).max(0.0)
    }
}

/// One frame being drawn on.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Wrap a copy of straight RGBA `pixels`.
    pub fn from_rgba(dims: Dimensions, pixels: &[u8]) -> Result<Self, EncodeError> {
        if pixels.len() != dims.rgba_len() {
            return Err(EncodeError::backend(format!(
                "frame has {} bytes, expected {}",
                pixels.len(),
                dims.rgba_len()
            )));
        }
        let mut pixmap = Pixmap::new(dims.width, dims.height).ok_or(EncodeError::FrameTooLarge {
            width: dims.width,
            height: dims.height,
        })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(pixels.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight RGBA pixels.
    pub fn into_rgba(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Fill a rectangle with rounded corners.
    pub fn fill_rounded_rect(&mut self, rect: RectF, radius: f32, color: Color) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &solid_paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Paint a blurred, offset copy of a rounded rectangle in the shadow
    /// colour. Drawn before the rectangle itself so it sits beneath.
    pub fn draw_shadow(&mut self, rect: RectF, radius: f32, shadow: &Shadow) {
        if shadow.color.a == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let blur_radius = (shadow.blur / 2.0).ceil() as u32;
        let pad = blur_radius * BLUR_PASSES as u32 + 1;
        let width = rect.width.ceil() as u32 + pad * 2;
        let height = rect.height.ceil() as u32 + pad * 2;
        let Some(mut layer) = Pixmap::new(width, height) else {
            return;
        };

        let local = RectF::new(
            pad as f32 + rect.x.fract(),
            pad as f32 + rect.y.fract(),
            rect.width,
            rect.height,
        );
        if let Some(path) = rounded_rect_path(local, radius) {
            layer.fill_path(
                &path,
                &solid_paint(shadow.color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        if blur_radius > 0 {
            box_blur(&mut layer, blur_radius as usize);
        }

        let x = (rect.x.floor() + shadow.offset_x).round() as i32 - pad as i32;
        let y = (rect.y.floor() + shadow.offset_y).round() as i32 - pad as i32;
        self.pixmap.draw_pixmap(
            x,
            y,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Source-over blend a coverage mask (e.g. a rasterized glyph) whose
    /// top-left corner sits at `(x, y)`. Parts off the canvas are clipped.
    pub fn blend_coverage(
        &mut self,
        x: i32,
        y: i32,
        mask_width: usize,
        mask_height: usize,
        coverage: &[u8],
        color: Color,
    ) {
        let canvas_width = self.pixmap.width() as i32;
        let canvas_height = self.pixmap.height() as i32;
        let pixels = self.pixmap.pixels_mut();

        for row in 0..mask_height {
            let py = y + row as i32;
            if py < 0 || py >= canvas_height {
                continue;
            }
            for col in 0..mask_width {
                let px = x + col as i32;
                if px < 0 || px >= canvas_width {
                    continue;
                }
                let Some(&mask) = coverage.get(row * mask_width + col) else {
                    return;
                };
                if mask == 0 {
                    continue;
                }
                let alpha = (u16::from(mask) * u16::from(color.a) / 255) as u8;
                let index = (py * canvas_width + px) as usize;
                pixels[index] = source_over(pixels[index], color, alpha);
            }
        }
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn rounded_rect_path(rect: RectF, radius: f32) -> Option<Path> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let r = rect.clamp_radius(radius);
    if r <= 0.0 {
        let rect = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)?;
        return Some(PathBuilder::from_rect(rect));
    }

    let RectF {
        x,
        y,
        width: w,
        height: h,
    } = rect;
    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn source_over(dst: PremultipliedColorU8, color: Color, alpha: u8) -> PremultipliedColorU8 {
    let a = u32::from(alpha);
    let inv = 255 - a;
    let blend = |src: u8, dst: u8| -> u8 {
        ((u32::from(src) * a + u32::from(dst) * inv + 127) / 255) as u8
    };
    let out_a = (a * 255 + u32::from(dst.alpha()) * inv + 127) / 255;
    let r = blend(color.r, dst.red());
    let g = blend(color.g, dst.green());
    let b = blend(color.b, dst.blue());
    let out_a = out_a as u8;
    PremultipliedColorU8::from_rgba(r.min(out_a), g.min(out_a), b.min(out_a), out_a)
        .unwrap_or(dst)
}

/// Separable box blur over premultiplied data, repeated [`BLUR_PASSES`]
/// times in each direction.
fn box_blur(pixmap: &mut Pixmap, radius: usize) {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let data = pixmap.data_mut();
    let mut scratch = vec![0u8; data.len()];

    for _ in 0..BLUR_PASSES {
        blur_lines(data, &mut scratch, width, height, radius, true);
        blur_lines(&scratch, data, width, height, radius, false);
    }
}

fn blur_lines(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    radius: usize,
    horizontal: bool,
) {
    let (lines, len) = if horizontal {
        (height, width)
    } else {
        (width, height)
    };
    let index = |line: usize, pos: usize| {
        if horizontal {
            (line * width + pos) * 4
        } else {
            (pos * width + line) * 4
        }
    };
    let window = (radius * 2 + 1) as u32;

    for line in 0..lines {
        let mut sum = [0u32; 4];
        for pos in 0..=radius.min(len - 1) {
            let i = index(line, pos);
            for c in 0..4 {
                sum[c] += u32::from(src[i + c]);
            }
        }
        for pos in 0..len {
            let o = index(line, pos);
            for c in 0..4 {
                dst[o + c] = (sum[c] / window) as u8;
            }
            let add = pos + radius + 1;
            if add < len {
                let i = index(line, add);
                for c in 0..4 {
                    sum[c] += u32::from(src[i + c]);
                }
            }
            if pos >= radius {
                let i = index(line, pos - radius);
                for c in 0..4 {
                    sum[c] -= u32::from(src[i + c]);
                }
            }
        }
    }
}
