//! Overlay arguments shared by the GIF commands.

use std::path::PathBuf;

use addtextgif_editor::EditorSession;
use addtextgif_editor_model::overlay::OverlayPatch;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;

/// Captions from a JSON file and/or a single caption from flags.
#[derive(Debug, Clone, Args)]
pub struct OverlayArgs {
    /// JSON array of `{ text, start_ms, end_ms, x, y, template }`
    #[arg(long)]
    pub overlays: Option<PathBuf>,

    /// Caption text for a single overlay
    #[arg(short, long)]
    pub text: Option<String>,

    /// Caption start in milliseconds
    #[arg(long)]
    pub start: Option<i64>,

    /// Caption end in milliseconds
    #[arg(long)]
    pub end: Option<i64>,

    /// Horizontal anchor, 0.0 (left) to 1.0 (right)
    #[arg(long)]
    pub x: Option<f64>,

    /// Vertical anchor, 0.0 (top) to 1.0 (bottom)
    #[arg(long)]
    pub y: Option<f64>,

    /// Template id (classic, subtitle, highlight, minimal)
    #[arg(long)]
    pub template: Option<String>,
}

/// One caption as written in an overlays file. Omitted fields keep the
/// defaults a newly added overlay gets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlaySpec {
    pub text: Option<String>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub template: Option<String>,
}

impl OverlayArgs {
    /// All captions requested: the file's entries first, then the flags.
    pub fn specs(&self) -> anyhow::Result<Vec<OverlaySpec>> {
        let mut specs = match &self.overlays {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                parse_specs(&content)
                    .with_context(|| format!("Invalid overlays file {}", path.display()))?
            }
            None => Vec::new(),
        };
        if let Some(text) = &self.text {
            specs.push(OverlaySpec {
                text: Some(text.clone()),
                start_ms: self.start,
                end_ms: self.end,
                x: self.x,
                y: self.y,
                template: self.template.clone(),
            });
        }
        Ok(specs)
    }
}

pub fn parse_specs(json: &str) -> serde_json::Result<Vec<OverlaySpec>> {
    serde_json::from_str(json)
}

/// Add every spec to the session, in order.
pub fn apply(session: &mut EditorSession, specs: &[OverlaySpec]) -> anyhow::Result<usize> {
    for spec in specs {
        let default_template = session.catalog().default_template().id.clone();
        let template = spec.template.clone().unwrap_or(default_template);
        if session.catalog().get(&template).is_none() {
            tracing::warn!(template = %template, "Unknown template, using the default");
        }
        let text = spec
            .text
            .clone()
            .unwrap_or_else(|| session.config().locale.default_overlay_text().to_string());
        let id = session
            .add_overlay_with(text, template)
            .context("No GIF loaded")?;

        let current = session
            .overlays()
            .get(id)
            .map(|item| (item.start_ms() as i64, item.end_ms() as i64, item.position()))
            .context("Overlay vanished after insert")?;
        let (start, end, position) = current;

        let mut patch = OverlayPatch::window(
            spec.start_ms.unwrap_or(start),
            spec.end_ms.unwrap_or(end),
        );
        patch.x = Some(spec.x.unwrap_or(position.x));
        patch.y = Some(spec.y.unwrap_or(position.y));
        session.update_overlay(id, patch);
    }
    Ok(specs.len())
}
