use std::sync::Arc;

use addtextgif_editor_model::frame::{Dimensions, Document, Frame};
use addtextgif_editor_model::overlay::{OverlayPatch, OverlayStore};
use addtextgif_editor_model::template::TemplateCatalog;
use addtextgif_render_engine::{decode, decode_blocking, FontBook, RenderJob, RenderOptions};

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn white_document(width: u32, height: u32, delays_ms: &[u32]) -> Document {
    let dims = Dimensions::new(width, height);
    let frames = delays_ms
        .iter()
        .enumerate()
        .map(|(i, delay)| {
            let pixels = WHITE.iter().copied().cycle().take(dims.rgba_len()).collect();
            Frame::new(i, *delay, dims, pixels, Vec::new()).expect("frame should build")
        })
        .collect();
    Document::new(frames, dims).expect("document should build")
}

fn pixel(frame: &Frame, width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    let p = &frame.pixels()[i..i + 4];
    [p[0], p[1], p[2], p[3]]
}

#[tokio::test]
async fn export_preserves_frames_and_burns_overlay_into_its_window() {
    let document = white_document(80, 60, &[100, 150, 200]);
    let total = document.total_duration_ms();

    let mut store = OverlayStore::new();
    let id = store
        .add(true, total, "Hello", "classic")
        .expect("frames are loaded");
    store.update(id, OverlayPatch::window(120, 260), total);
    store.update(id, OverlayPatch::position(0.5, 0.5), total);

    let job = RenderJob::new(
        &document,
        store.items(),
        Arc::new(TemplateCatalog::builtin()),
        Arc::new(FontBook::empty()),
    )
    .with_options(RenderOptions {
        workers: 2,
        quality: 10,
    });
    let result = job.run(None).await.expect("export should succeed");

    let exported = decode(result.bytes().to_vec())
        .await
        .expect("export should decode");
    assert_eq!(exported.frame_count(), 3);
    assert_eq!(exported.dimensions(), document.dimensions());
    let delays: Vec<u32> = exported.frames().iter().map(Frame::delay_ms).collect();
    assert_eq!(delays, vec![100, 150, 200]);

    // Frame 0 ends before the overlay starts: untouched.
    assert_eq!(pixel(&exported.frames()[0], 80, 40, 30), WHITE);
    // Frames 1 and 2 intersect the window: the caption background darkens the anchor.
    for frame in &exported.frames()[1..] {
        let [r, g, b, a] = pixel(frame, 80, 40, 30);
        assert_eq!(a, 255);
        assert!(r < 200 && g < 200 && b < 200, "anchor pixel was {r},{g},{b}");
    }
}

#[tokio::test]
async fn export_without_overlays_round_trips_pixels() {
    let document = white_document(16, 16, &[20, 40]);
    let result = RenderJob::new(
        &document,
        &[],
        Arc::new(TemplateCatalog::builtin()),
        Arc::new(FontBook::empty()),
    )
    .run(None)
    .await
    .expect("export should succeed");

    let exported = decode_blocking(result.bytes()).expect("export should decode");
    for (original, exported) in document.frames().iter().zip(exported.frames()) {
        assert_eq!(original.pixels(), exported.pixels());
        assert_eq!(original.delay_ms(), exported.delay_ms());
    }
}

#[tokio::test]
async fn exports_get_distinct_file_names() {
    let document = white_document(4, 4, &[100]);
    let catalog = Arc::new(TemplateCatalog::builtin());
    let fonts = Arc::new(FontBook::empty());

    let first = RenderJob::new(&document, &[], Arc::clone(&catalog), Arc::clone(&fonts))
        .run(None)
        .await
        .expect("first export");
    let second = RenderJob::new(&document, &[], catalog, fonts)
        .run(None)
        .await
        .expect("second export");
    assert_ne!(first.file_name(), second.file_name());
}
