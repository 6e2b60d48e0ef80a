use std::sync::Arc;

use addtextgif_common::error::{DecodeError, EditorError};
use addtextgif_editor::{BusyState, EditorSession, SessionConfig};
use addtextgif_editor_model::overlay::OverlayPatch;
use addtextgif_editor_model::template::TemplateCatalog;
use addtextgif_render_engine::FontBook;

/// A looping GIF of solid frames with the given delays in centiseconds.
fn sample_gif(width: u16, height: u16, delays_cs: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder =
            gif::Encoder::new(&mut out, width, height, &[]).expect("encoder should start");
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .expect("loop extension");
        for (i, delay) in delays_cs.iter().enumerate() {
            let shade = (i as u8).wrapping_mul(60);
            let mut rgba: Vec<u8> = [shade, 128, 255 - shade, 255]
                .iter()
                .copied()
                .cycle()
                .take(width as usize * height as usize * 4)
                .collect();
            let mut frame = gif::Frame::from_rgba_speed(width, height, &mut rgba, 10);
            frame.delay = *delay;
            encoder.write_frame(&frame).expect("frame should encode");
        }
    }
    out
}

fn session() -> EditorSession {
    EditorSession::new(
        SessionConfig::default(),
        Arc::new(TemplateCatalog::builtin()),
        Arc::new(FontBook::empty()),
    )
}

#[tokio::test]
async fn load_caption_and_export() {
    let mut editor = session();
    editor
        .load_gif(sample_gif(40, 30, &[10, 15, 20]))
        .await
        .expect("sample should decode");
    assert_eq!(editor.busy(), BusyState::Idle);
    assert_eq!(editor.timeline().total_duration_ms(), 450);

    let id = editor.add_overlay().expect("document is loaded");
    assert!(editor.update_overlay(id, OverlayPatch::window(50, 300)));
    assert!(editor.update_overlay(id, OverlayPatch::text("Hello there")));

    let first_name = {
        let result = editor.export(None).await.expect("export should succeed");
        assert!(result.bytes().starts_with(b"GIF89a"));
        assert_eq!(result.mime_type(), "image/gif");
        result.file_name().to_string()
    };
    assert_eq!(editor.busy(), BusyState::Idle);

    let second_name = editor
        .export(None)
        .await
        .expect("second export should succeed")
        .file_name()
        .to_string();
    assert_ne!(first_name, second_name);
    assert_eq!(
        editor.last_export().map(|r| r.file_name().to_string()),
        Some(second_name)
    );

    let exported = editor
        .last_export()
        .map(|r| r.bytes().to_vec())
        .expect("export is held");
    let reloaded = addtextgif_render_engine::decode_blocking(&exported).expect("export decodes");
    assert_eq!(reloaded.frame_count(), 3);
    assert_eq!(reloaded.total_duration_ms(), 450);
}

#[tokio::test]
async fn invalid_upload_reports_error_and_keeps_editor_usable() {
    let mut editor = session();
    let err = editor
        .load_gif(b"definitely not a gif".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Decode(DecodeError::Signature)));
    assert!(editor.document().is_none());
    assert!(editor.last_error().is_some());
    assert!(!editor.is_busy());

    editor
        .load_gif(sample_gif(4, 4, &[0, 1]))
        .await
        .expect("retry should succeed");
    assert!(editor.last_error().is_none());
    // 0 and 1 centisecond delays are floored to 20 ms.
    assert_eq!(editor.timeline().total_duration_ms(), 40);
}

#[tokio::test]
async fn loading_a_new_gif_drops_the_previous_export() {
    let mut editor = session();
    editor
        .load_gif(sample_gif(4, 4, &[10]))
        .await
        .expect("first load");
    editor.export(None).await.expect("export");
    assert!(editor.last_export().is_some());

    editor
        .load_gif(sample_gif(4, 4, &[10, 10]))
        .await
        .expect("second load");
    assert!(editor.last_export().is_none());
    assert!(editor.overlays().is_empty());
}
