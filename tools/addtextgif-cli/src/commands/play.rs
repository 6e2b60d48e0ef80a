//! Simulate playback and print what the preview would show.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use addtextgif_common::clock::refresh_interval;
use addtextgif_common::config::AppConfig;
use addtextgif_editor_model::timeline::format_duration;

use super::overlays::{self, OverlayArgs};

const REFRESH_HZ: u32 = 60;

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    overlay_args: OverlayArgs,
    seconds: f64,
) -> anyhow::Result<()> {
    let specs = overlay_args.specs()?;
    let mut session = super::open_session(config, &input).await?;
    overlays::apply(&mut session, &specs)?;

    if !session.play() {
        anyhow::bail!("Nothing to play: {} has zero duration", input.display());
    }
    println!(
        "Playing {} ({}) for {seconds:.1}s",
        input.display(),
        format_duration(session.timeline().total_duration_ms() as f64)
    );

    let run_for = Duration::from_secs_f64(seconds.max(0.0));
    let started = Instant::now();
    let mut interval = tokio::time::interval(refresh_interval(REFRESH_HZ));
    let mut shown: Option<(usize, Vec<String>)> = None;

    while started.elapsed() < run_for {
        interval.tick().await;
        session.tick(Instant::now());

        let Some(frame) = session.current_frame().map(|f| f.index()) else {
            continue;
        };
        let captions: Vec<String> = session
            .active_overlays()
            .iter()
            .map(|item| item.text().to_string())
            .collect();
        let state = (frame, captions);
        if shown.as_ref() != Some(&state) {
            println!(
                "  {:>8}  frame #{:<4} {}",
                format_duration(session.current_ms()),
                state.0,
                state.1.join(" | ")
            );
            shown = Some(state);
        }
    }

    session.pause();
    Ok(())
}
