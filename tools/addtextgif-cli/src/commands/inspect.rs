//! Show GIF information.

use std::path::PathBuf;

use addtextgif_common::config::AppConfig;
use addtextgif_editor_model::timeline::format_duration;

pub async fn run(config: &AppConfig, input: PathBuf) -> anyhow::Result<()> {
    let session = super::open_session(config, &input).await?;
    let Some(document) = session.document() else {
        anyhow::bail!("No frames decoded from {}", input.display());
    };
    let dims = document.dimensions();

    println!("GIF: {}", input.display());
    println!("  Size: {}x{}", dims.width, dims.height);
    println!("  Frames: {}", document.frame_count());
    println!(
        "  Duration: {}",
        format_duration(document.total_duration_ms() as f64)
    );
    println!();

    println!("Frames:");
    for (frame, span) in document
        .frames()
        .iter()
        .zip(session.timeline().offsets().spans())
    {
        println!(
            "  #{:<4} start {:>8}  delay {:>5} ms",
            frame.index(),
            format_duration(span.start_ms as f64),
            frame.delay_ms()
        );
    }

    Ok(())
}
