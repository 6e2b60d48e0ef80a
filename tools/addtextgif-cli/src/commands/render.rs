//! Burn captions into a GIF and write the export.

use std::io::Write;
use std::path::PathBuf;

use addtextgif_common::config::AppConfig;
use anyhow::Context;
use addtextgif_editor::SessionConfig;
use addtextgif_render_engine::export::{ExportProgress, ExportStage, ProgressCallback};

use super::overlays::{self, OverlayArgs};

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    overlay_args: OverlayArgs,
    output: Option<PathBuf>,
    workers: Option<usize>,
    quality: Option<i32>,
) -> anyhow::Result<()> {
    println!("Rendering: {}", input.display());

    let mut session_config = SessionConfig::from_app_config(config);
    if let Some(workers) = workers {
        session_config.render.workers = workers;
    }
    if let Some(quality) = quality {
        session_config.render.quality = quality;
    }
    let specs = overlay_args.specs()?;

    let mut session = super::open_session_with(config, session_config, &input).await?;
    let added = overlays::apply(&mut session, &specs)?;
    let output_dir = output.unwrap_or_else(|| config.render.output_dir.clone());

    println!("  Overlays: {added}");
    println!(
        "  Workers: {}, quality: {}",
        session.config().render.workers,
        session.config().render.quality
    );

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        if p.stage == ExportStage::Rendering {
            print!(
                "\r  Progress: {:.1}% ({}/{} frames)  ",
                p.progress * 100.0,
                p.frames_rendered,
                p.total_frames,
            );
            let _ = std::io::stdout().flush();
        }
    });

    let (bytes, mime_type) = match session.export(Some(progress_cb)).await {
        Ok(result) => (result.bytes().len(), result.mime_type()),
        Err(e) => {
            println!();
            return Err(anyhow::anyhow!("Export failed: {e}"));
        }
    };

    let path = session
        .save_export(&output_dir)?
        .context("Export finished without a result")?;
    println!(
        "\nExport complete: {} ({bytes} bytes, {mime_type})",
        path.display(),
    );
    Ok(())
}
