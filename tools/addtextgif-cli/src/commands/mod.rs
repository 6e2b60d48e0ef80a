pub mod inspect;
pub mod overlays;
pub mod play;
pub mod preview;
pub mod render;
pub mod templates;

use std::path::Path;
use std::sync::Arc;

use addtextgif_common::config::AppConfig;
use addtextgif_editor::{EditorSession, SessionConfig};
use addtextgif_editor_model::template::TemplateCatalog;
use addtextgif_render_engine::FontBook;
use anyhow::Context;

/// Build a session from config and load `input` into it.
pub async fn open_session(config: &AppConfig, input: &Path) -> anyhow::Result<EditorSession> {
    open_session_with(config, SessionConfig::from_app_config(config), input).await
}

/// Like [`open_session`], with explicit session settings.
pub async fn open_session_with(
    config: &AppConfig,
    session_config: SessionConfig,
    input: &Path,
) -> anyhow::Result<EditorSession> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut session = EditorSession::new(
        session_config,
        Arc::new(TemplateCatalog::builtin()),
        Arc::new(FontBook::load(&config.fonts)),
    );
    session
        .load_gif(bytes)
        .await
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    Ok(session)
}
