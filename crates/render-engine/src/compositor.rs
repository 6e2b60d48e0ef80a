//! Frame compositor: burns caption overlays into decoded frames.
//!
//! Planning is separate from drawing. [`plan_compositions`] decides which
//! overlays land on which frame; [`composite_frame`] draws them.

use addtextgif_common::error::EncodeError;
use addtextgif_editor_model::frame::{Dimensions, Frame};
use addtextgif_editor_model::overlay::OverlayItem;
use addtextgif_editor_model::template::TemplateCatalog;

use crate::raster::{Canvas, RectF};
use crate::text::TextPainter;

/// A single frame's composition instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameComposition {
    /// Frame number.
    pub frame_index: usize,

    /// Time at which the frame starts showing, in milliseconds.
    pub elapsed_ms: u64,

    /// How long the frame shows, in milliseconds.
    pub delay_ms: u64,

    /// Indices into the overlay list, in draw order.
    pub overlays: Vec<usize>,
}

/// Compute the composition for each frame in the export. An overlay is
/// burned into a frame when its window intersects the frame's display
/// interval `[elapsed, elapsed + delay)`.
pub fn plan_compositions(frames: &[Frame], overlays: &[OverlayItem]) -> Vec<FrameComposition> {
    let mut elapsed_ms = 0u64;
    let mut compositions = Vec::with_capacity(frames.len());

    for frame in frames {
        let delay_ms = u64::from(frame.delay_ms());
        let active = overlays
            .iter()
            .enumerate()
            .filter(|(_, overlay)| overlay.overlaps_frame(elapsed_ms, delay_ms))
            .map(|(i, _)| i)
            .collect();

        compositions.push(FrameComposition {
            frame_index: frame.index(),
            elapsed_ms,
            delay_ms,
            overlays: active,
        });
        elapsed_ms += delay_ms;
    }

    compositions
}

/// Draw `overlays` onto a copy of `frame`, returning straight RGBA.
pub fn composite_frame(
    frame: &Frame,
    overlays: &[&OverlayItem],
    dims: Dimensions,
    catalog: &TemplateCatalog,
    painter: &mut TextPainter<'_>,
) -> Result<Vec<u8>, EncodeError> {
    let mut canvas = Canvas::from_rgba(dims, frame.pixels())?;
    for overlay in overlays {
        draw_overlay(&mut canvas, overlay, dims, catalog, painter);
    }
    Ok(canvas.into_rgba())
}

/// Draw the overlays visible in the live preview at `t_ms` onto `frame`.
pub fn composite_preview(
    frame: &Frame,
    overlays: &[OverlayItem],
    t_ms: f64,
    dims: Dimensions,
    catalog: &TemplateCatalog,
    painter: &mut TextPainter<'_>,
) -> Result<Vec<u8>, EncodeError> {
    let visible: Vec<&OverlayItem> = overlays
        .iter()
        .filter(|overlay| overlay.is_active_at(t_ms))
        .collect();
    composite_frame(frame, &visible, dims, catalog, painter)
}

/// Geometry of one caption on a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionLayout {
    /// Background box, padding split evenly around the text.
    pub background: RectF,
    /// Left edge of the text.
    pub text_x: f32,
    /// Top of the text line box.
    pub text_top: f32,
    pub text_width: f32,
}

/// Lay out a caption whose text is `text_width` pixels wide. The anchor
/// is the horizontal centre and top edge of the text.
pub fn layout_caption(
    anchor: (f32, f32),
    text_width: f32,
    font_size: f32,
    padding: f32,
) -> CaptionLayout {
    let (x, y) = anchor;
    CaptionLayout {
        background: RectF::new(
            x - text_width / 2.0 - padding / 2.0,
            y - padding / 2.0,
            text_width + padding,
            font_size + padding,
        ),
        text_x: x - text_width / 2.0,
        text_top: y,
        text_width,
    }
}

fn draw_overlay(
    canvas: &mut Canvas,
    overlay: &OverlayItem,
    dims: Dimensions,
    catalog: &TemplateCatalog,
    painter: &mut TextPainter<'_>,
) {
    let template = catalog.by_id(overlay.template_id());
    let font = painter.resolve(template.font_families(), template.font_weight());
    let text_width = painter.measure(font, overlay.text(), template.font_size);
    let layout = layout_caption(
        overlay.position().to_pixels(dims),
        text_width,
        template.font_size,
        template.padding,
    );

    if let Some(shadow) = &template.shadow {
        canvas.draw_shadow(layout.background, template.border_radius, shadow);
    }
    canvas.fill_rounded_rect(
        layout.background,
        template.border_radius,
        template.background_color,
    );
    painter.draw(
        canvas,
        font,
        layout.text_x,
        layout.text_top,
        overlay.text(),
        template.font_size,
        template.color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use addtextgif_editor_model::overlay::{OverlayPatch, OverlayStore};
    use proptest::prelude::*;

    use crate::text::FontBook;

    fn frames(delays: &[u32]) -> Vec<Frame> {
        let dims = Dimensions::new(1, 1);
        delays
            .iter()
            .enumerate()
            .map(|(i, d)| Frame::new(i, *d, dims, vec![0, 0, 0, 255], Vec::new()).unwrap())
            .collect()
    }

    fn overlays(windows: &[(i64, i64)], total: u64) -> Vec<OverlayItem> {
        let mut store = OverlayStore::new();
        for (start, end) in windows {
            let id = store.add(true, total, "Hi", "classic").unwrap();
            store.update(id, OverlayPatch::window(*start, *end), total);
        }
        store.items().to_vec()
    }

    #[test]
    fn test_plan_elapsed_and_overlap() {
        let frames = frames(&[100, 150, 200]);
        let overlays = overlays(&[(120, 260), (0, 100)], 450);
        let plan = plan_compositions(&frames, &overlays);

        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.iter().map(|c| c.elapsed_ms).collect::<Vec<_>>(),
            vec![0, 100, 250]
        );
        // Second overlay ends exactly where frame 1 starts: not drawn there.
        assert_eq!(plan[0].overlays, vec![1]);
        assert_eq!(plan[1].overlays, vec![0]);
        assert_eq!(plan[2].overlays, vec![0]);
    }

    #[test]
    fn test_plan_partial_overlap_reaches_every_frame() {
        // Frames cover [0,100) [100,250) [250,450); the caption touches each.
        let frames = frames(&[100, 150, 200]);
        let overlays = overlays(&[(50, 300)], 450);
        let plan = plan_compositions(&frames, &overlays);
        assert!(plan.iter().all(|c| c.overlays == vec![0]));
        assert_eq!(
            plan.iter().map(|c| c.delay_ms).collect::<Vec<_>>(),
            vec![100, 150, 200]
        );
    }

    #[test]
    fn test_plan_keeps_insertion_order() {
        let frames = frames(&[100]);
        let overlays = overlays(&[(0, 100), (0, 100), (0, 100)], 100);
        let plan = plan_compositions(&frames, &overlays);
        assert_eq!(plan[0].overlays, vec![0, 1, 2]);
    }

    #[test]
    fn test_layout_splits_padding() {
        let layout = layout_caption((100.0, 80.0), 40.0, 36.0, 16.0);
        assert_eq!(layout.background, RectF::new(72.0, 72.0, 56.0, 52.0));
        assert_eq!(layout.text_x, 80.0);
        assert_eq!(layout.text_top, 80.0);
    }

    #[test]
    fn test_composite_draws_background_without_fonts() {
        let dims = Dimensions::new(64, 64);
        let frame = Frame::new(0, 100, dims, vec![0; dims.rgba_len()], Vec::new()).unwrap();
        let mut store = OverlayStore::new();
        let id = store.add(true, 100, "Hello", "classic").unwrap();
        store.update(id, OverlayPatch::position(0.5, 0.5), 100);
        let overlay = store.get(id).unwrap();

        let catalog = TemplateCatalog::builtin();
        let fonts = FontBook::empty();
        let mut painter = TextPainter::new(&fonts);
        let out = composite_frame(&frame, &[overlay], dims, &catalog, &mut painter).unwrap();

        // Anchor pixel sits inside the caption background.
        let i = (32 * 64 + 32) * 4;
        assert!(out[i + 3] > 0);
        // The source frame is left untouched.
        assert!(frame.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_composite_without_overlays_is_identity() {
        let dims = Dimensions::new(2, 1);
        let pixels = vec![10, 20, 30, 255, 40, 50, 60, 255];
        let frame = Frame::new(0, 100, dims, pixels.clone(), Vec::new()).unwrap();
        let fonts = FontBook::empty();
        let mut painter = TextPainter::new(&fonts);
        let out = composite_frame(
            &frame,
            &[],
            dims,
            &TemplateCatalog::builtin(),
            &mut painter,
        )
        .unwrap();
        assert_eq!(out, pixels);
    }

    proptest! {
        #[test]
        fn prop_plan_matches_overlap_rule(
            delays in prop::collection::vec(20u32..500, 1..12),
            start in 0i64..6_000,
            len in 0i64..6_000,
        ) {
            let frames = frames(&delays);
            let total: u64 = delays.iter().map(|d| u64::from(*d)).sum();
            let overlays = overlays(&[(start, start + len)], total);
            let (from, to) = (overlays[0].start_ms(), overlays[0].end_ms());
            let plan = plan_compositions(&frames, &overlays);

            let mut elapsed = 0u64;
            for (composition, delay) in plan.iter().zip(&delays) {
                prop_assert_eq!(composition.elapsed_ms, elapsed);
                let expected = elapsed + u64::from(*delay) > from && elapsed < to;
                prop_assert_eq!(composition.overlays == vec![0], expected);
                elapsed += u64::from(*delay);
            }
            prop_assert_eq!(elapsed, total);
        }
    }
}
