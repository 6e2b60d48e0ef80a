//! Write a single captioned frame as PNG.

use std::path::PathBuf;

use addtextgif_common::config::AppConfig;
use addtextgif_editor_model::timeline::format_duration;
use addtextgif_render_engine::decode::encode_preview;
use anyhow::Context;

use super::overlays::{self, OverlayArgs};

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    overlay_args: OverlayArgs,
    at: f64,
    output: PathBuf,
) -> anyhow::Result<()> {
    let specs = overlay_args.specs()?;
    let mut session = super::open_session(config, &input).await?;
    overlays::apply(&mut session, &specs)?;

    session.seek(at);
    let Some(document) = session.document() else {
        anyhow::bail!("No frames decoded from {}", input.display());
    };
    let dims = document.dimensions();

    let pixels = session
        .render_preview()?
        .context("No frame at the requested time")?;
    let png = encode_preview(&pixels, dims)?;
    std::fs::write(&output, png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let frame = session.current_frame().map(|f| f.index()).unwrap_or(0);
    println!(
        "Preview at {} (frame #{frame}, {} overlays): {}",
        format_duration(session.current_ms()),
        session.active_overlays().len(),
        output.display()
    );
    Ok(())
}
