//! Editing session management.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use addtextgif_common::clock::PlaybackClock;
use addtextgif_common::config::AppConfig;
use addtextgif_common::error::{DecodeError, EditorError, EditorResult, EncodeError};
use addtextgif_common::locale::Locale;
use addtextgif_editor_model::frame::{Document, Frame};
use addtextgif_editor_model::overlay::{OverlayId, OverlayItem, OverlayPatch, OverlayStore};
use addtextgif_editor_model::position::NormalizedPoint;
use addtextgif_editor_model::template::TemplateCatalog;
use addtextgif_editor_model::timeline::Timeline;
use addtextgif_render_engine::compositor::composite_preview;
use addtextgif_render_engine::export::{
    AbortHandle, ProgressCallback, RenderJob, RenderOptions, RenderResult,
};
use addtextgif_render_engine::text::{FontBook, TextPainter};

/// Configuration for an editing session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Drives the default text of new overlays.
    pub locale: Locale,

    /// Encoder settings for exports.
    pub render: RenderOptions,
}

impl SessionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            locale: config.locale(),
            render: RenderOptions::from(&config.render),
        }
    }
}

/// Long-running operation in flight, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusyState {
    #[default]
    Idle,
    Decoding,
    Rendering,
}

impl BusyState {
    fn operation(&self) -> &'static str {
        match self {
            Self::Idle => "nothing",
            Self::Decoding => "decoding",
            Self::Rendering => "rendering",
        }
    }
}

/// An overlay being dragged, with the pointer's offset from its anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    id: OverlayId,
    grab_offset: (f64, f64),
}

/// The editor: one document, its playback cursor, its overlays, and the
/// most recent export.
pub struct EditorSession {
    config: SessionConfig,
    catalog: Arc<TemplateCatalog>,
    fonts: Arc<FontBook>,
    document: Option<Document>,
    timeline: Timeline,
    overlays: OverlayStore,
    last_export: Option<RenderResult>,
    export_abort: Option<AbortHandle>,
    busy: BusyState,
    clock: PlaybackClock,
    drag: Option<DragState>,
    last_error: Option<String>,
}

impl EditorSession {
    pub fn new(config: SessionConfig, catalog: Arc<TemplateCatalog>, fonts: Arc<FontBook>) -> Self {
        Self {
            config,
            catalog,
            fonts,
            document: None,
            timeline: Timeline::new(),
            overlays: OverlayStore::new(),
            last_export: None,
            export_abort: None,
            busy: BusyState::Idle,
            clock: PlaybackClock::new(),
            drag: None,
            last_error: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn busy(&self) -> BusyState {
        self.busy
    }

    pub fn is_busy(&self) -> bool {
        self.busy != BusyState::Idle
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    pub fn last_export(&self) -> Option<&RenderResult> {
        self.last_export.as_ref()
    }

    /// User-facing message from the last failed decode or export.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn total_duration_ms(&self) -> u64 {
        self.document
            .as_ref()
            .map_or(0, Document::total_duration_ms)
    }

    fn ensure_idle(&self) -> EditorResult<()> {
        if self.is_busy() {
            return Err(EditorError::busy(self.busy.operation()));
        }
        Ok(())
    }

    // ── Loading ───────────────────────────────────────────────────────

    /// Mark a decode as started. Fails while another operation runs.
    pub fn begin_decode(&mut self) -> EditorResult<()> {
        self.ensure_idle()?;
        self.busy = BusyState::Decoding;
        self.last_error = None;
        Ok(())
    }

    /// Complete a decode started with [`EditorSession::begin_decode`].
    ///
    /// Success replaces the document and resets playback, overlays and the
    /// held export. Failure leaves the previous state untouched.
    pub fn finish_decode(&mut self, result: Result<Document, DecodeError>) -> EditorResult<()> {
        self.busy = BusyState::Idle;
        match result {
            Ok(document) => {
                self.install(document);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "GIF decode failed");
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Decode `bytes` and make the result the current document.
    pub async fn load_gif(&mut self, bytes: Vec<u8>) -> EditorResult<()> {
        self.begin_decode()?;
        let result = addtextgif_render_engine::decode(bytes).await;
        self.finish_decode(result)
    }

    fn install(&mut self, document: Document) {
        self.clock.stop();
        self.timeline.load(document.frames());
        self.overlays.clear();
        self.last_export = None;
        self.drag = None;
        tracing::info!(
            frames = document.frame_count(),
            total_ms = document.total_duration_ms(),
            "Document loaded"
        );
        self.document = Some(document);
    }

    // ── Overlays ──────────────────────────────────────────────────────

    /// Add an overlay with the locale's default text and the default
    /// template. `None` when no GIF is loaded.
    pub fn add_overlay(&mut self) -> Option<OverlayId> {
        let text = self.config.locale.default_overlay_text();
        let template_id = self.catalog.default_template().id.clone();
        self.add_overlay_with(text, template_id)
    }

    /// Add an overlay with explicit text and template.
    pub fn add_overlay_with(
        &mut self,
        text: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Option<OverlayId> {
        let total = self.total_duration_ms();
        self.overlays
            .add(self.document.is_some(), total, text, template_id)
    }

    pub fn update_overlay(&mut self, id: OverlayId, patch: OverlayPatch) -> bool {
        let total = self.total_duration_ms();
        self.overlays.update(id, patch, total)
    }

    pub fn delete_overlay(&mut self, id: OverlayId) -> bool {
        if self.drag.is_some_and(|drag| drag.id == id) {
            self.drag = None;
        }
        self.overlays.remove(id)
    }

    /// Overlays visible in the preview at the cursor, in draw order.
    pub fn active_overlays(&self) -> Vec<&OverlayItem> {
        self.overlays
            .active_at(self.timeline.current_ms())
            .collect()
    }

    // ── Dragging ──────────────────────────────────────────────────────

    /// Start dragging overlay `id` from `pointer` (normalized). Returns
    /// `false` for unknown ids.
    pub fn begin_drag(&mut self, id: OverlayId, pointer: NormalizedPoint) -> bool {
        let Some(item) = self.overlays.get(id) else {
            return false;
        };
        self.drag = Some(DragState {
            id,
            grab_offset: pointer.offset_from(&item.position()),
        });
        true
    }

    /// Move the dragged overlay so it keeps its grab offset from `pointer`.
    pub fn drag_to(&mut self, pointer: NormalizedPoint) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let (dx, dy) = drag.grab_offset;
        self.update_overlay(drag.id, OverlayPatch::position(pointer.x - dx, pointer.y - dy))
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ── Playback ──────────────────────────────────────────────────────

    /// Start playback. Refused when there is nothing to play.
    pub fn play(&mut self) -> bool {
        self.clock.stop();
        self.timeline.play()
    }

    pub fn pause(&mut self) {
        self.timeline.pause();
        self.clock.stop();
    }

    /// Flip play/pause; returns whether playback is now running.
    pub fn toggle_playback(&mut self) -> bool {
        if self.timeline.is_playing() {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    pub fn seek(&mut self, t_ms: f64) {
        self.timeline.seek(t_ms);
    }

    pub fn reset_playback(&mut self) {
        self.timeline.reset();
    }

    /// Refresh callback: advance the cursor by the wall-clock time since the
    /// previous tick. Returns whether the cursor moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.timeline.is_playing() {
            self.clock.stop();
            return false;
        }
        let delta = self.clock.tick(now);
        self.timeline.advance(delta)
    }

    pub fn current_ms(&self) -> f64 {
        self.timeline.current_ms()
    }

    /// Frame under the cursor.
    pub fn current_frame(&self) -> Option<&Frame> {
        let index = self.timeline.current_frame_index()?;
        self.document.as_ref()?.frame(index)
    }

    /// Straight RGBA of the frame under the cursor with the visible
    /// overlays drawn on it.
    pub fn render_preview(&self) -> EditorResult<Option<Vec<u8>>> {
        let (Some(document), Some(frame)) = (self.document.as_ref(), self.current_frame()) else {
            return Ok(None);
        };
        let mut painter = TextPainter::new(&self.fonts);
        let pixels = composite_preview(
            frame,
            self.overlays.items(),
            self.timeline.current_ms(),
            document.dimensions(),
            &self.catalog,
            &mut painter,
        )?;
        Ok(Some(pixels))
    }

    // ── Export ────────────────────────────────────────────────────────

    /// Snapshot the document and overlays into a job and mark the session
    /// as rendering.
    pub fn begin_export(&mut self) -> EditorResult<RenderJob> {
        self.ensure_idle()?;
        let Some(document) = self.document.as_ref() else {
            return Err(EncodeError::NoFrames.into());
        };
        let job = RenderJob::new(
            document,
            self.overlays.items(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.fonts),
        )
        .with_options(self.config.render);

        self.export_abort = Some(job.abort_handle());
        self.busy = BusyState::Rendering;
        self.last_error = None;
        Ok(job)
    }

    /// Complete an export started with [`EditorSession::begin_export`]. A
    /// successful result replaces the previously held one.
    pub fn finish_export(
        &mut self,
        result: Result<RenderResult, EncodeError>,
    ) -> EditorResult<&RenderResult> {
        self.busy = BusyState::Idle;
        self.export_abort = None;
        match result {
            Ok(render) => Ok(self.last_export.insert(render)),
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Cancel the running export, if any.
    pub fn abort_export(&self) {
        if let Some(handle) = &self.export_abort {
            handle.abort();
        }
    }

    /// Write the held export into `dir`. Returns `None` when nothing has
    /// been exported yet.
    pub fn save_export(&self, dir: &Path) -> EditorResult<Option<PathBuf>> {
        let Some(render) = &self.last_export else {
            return Ok(None);
        };
        let path = render.save_to(dir)?;
        tracing::info!(path = %path.display(), bytes = render.bytes().len(), "Saved export");
        Ok(Some(path))
    }

    /// Export the current document with its overlays.
    pub async fn export(
        &mut self,
        progress: Option<ProgressCallback>,
    ) -> EditorResult<&RenderResult> {
        let job = self.begin_export()?;
        let result = job.run(progress).await;
        self.finish_export(result)
    }
}
