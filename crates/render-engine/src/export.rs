//! Export configuration and job management.
//!
//! A [`RenderJob`] snapshots the frames and overlays at submission time,
//! so later edits never leak into a running export. Frames are composited
//! and quantised by a pool of blocking workers; a single writer puts them
//! back in order and streams them into the GIF encoder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use addtextgif_common::clock::unique_unix_millis;
use addtextgif_common::config::RenderDefaults;
use addtextgif_common::error::EncodeError;
use addtextgif_editor_model::frame::{Dimensions, Document, Frame};
use addtextgif_editor_model::overlay::OverlayItem;
use addtextgif_editor_model::template::TemplateCatalog;
use gif::{DisposalMethod, Encoder, Repeat};

use crate::compositor::{composite_frame, plan_compositions, FrameComposition};
use crate::text::{FontBook, TextPainter};

/// MIME type of every export.
pub const GIF_MIME_TYPE: &str = "image/gif";

/// Largest width or height a GIF can describe.
pub const MAX_GIF_DIMENSION: u32 = u16::MAX as u32;

/// Encoder tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Parallel frame workers. Clamped to `[1, frame count]`.
    pub workers: usize,

    /// Quantisation speed, 1 (best) to 30 (fastest).
    pub quality: i32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            workers: 2,
            quality: 10,
        }
    }
}

impl From<&RenderDefaults> for RenderOptions {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            workers: defaults.workers,
            quality: defaults.quality,
        }
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    bytes: Vec<u8>,
    file_name: String,
    created_at_ms: i64,
}

impl RenderResult {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `addtextgif-<unix-millis>.gif`
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &'static str {
        GIF_MIME_TYPE
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    /// Write the export into `dir` under its file name.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Export file name for a millisecond stamp.
pub fn export_file_name(unix_millis: i64) -> String {
    format!("addtextgif-{unix_millis}.gif")
}

/// Cancels a running [`RenderJob`]. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames written to the encoder so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

fn report(
    progress: &Option<ProgressCallback>,
    stage: ExportStage,
    frames_rendered: u64,
    total_frames: u64,
) {
    if let Some(cb) = progress {
        let fraction = if total_frames == 0 {
            0.0
        } else {
            frames_rendered as f64 / total_frames as f64
        };
        cb(ExportProgress {
            progress: fraction,
            frames_rendered,
            total_frames,
            stage,
        });
    }
}

/// An export job ready to be rendered.
#[derive(Clone)]
pub struct RenderJob {
    frames: Arc<[Frame]>,
    overlays: Arc<[OverlayItem]>,
    dims: Dimensions,
    options: RenderOptions,
    catalog: Arc<TemplateCatalog>,
    fonts: Arc<FontBook>,
    abort: AbortHandle,
}

impl std::fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderJob")
            .field("frames", &self.frames.len())
            .field("overlays", &self.overlays.len())
            .field("dims", &self.dims)
            .field("options", &self.options)
            .finish()
    }
}

impl RenderJob {
    /// Snapshot `document` and `overlays` for export.
    pub fn new(
        document: &Document,
        overlays: &[OverlayItem],
        catalog: Arc<TemplateCatalog>,
        fonts: Arc<FontBook>,
    ) -> Self {
        Self::from_parts(
            document.shared_frames(),
            document.dimensions(),
            overlays,
            catalog,
            fonts,
        )
    }

    /// Build a job from raw frames. The frame list may be empty, in which
    /// case [`RenderJob::run`] fails with [`EncodeError::NoFrames`].
    pub fn from_parts(
        frames: Arc<[Frame]>,
        dims: Dimensions,
        overlays: &[OverlayItem],
        catalog: Arc<TemplateCatalog>,
        fonts: Arc<FontBook>,
    ) -> Self {
        Self {
            frames,
            overlays: overlays.into(),
            dims,
            options: RenderOptions::default(),
            catalog,
            fonts,
            abort: AbortHandle::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Composite every frame and encode the result as a looping GIF.
    pub async fn run(self, progress: Option<ProgressCallback>) -> Result<RenderResult, EncodeError> {
        let total = self.frames.len();
        if total == 0 {
            return Err(EncodeError::NoFrames);
        }
        if self.dims.width > MAX_GIF_DIMENSION || self.dims.height > MAX_GIF_DIMENSION {
            return Err(EncodeError::FrameTooLarge {
                width: self.dims.width,
                height: self.dims.height,
            });
        }

        let workers = self.options.workers.clamp(1, total);
        let speed = self.options.quality.clamp(1, 30);
        tracing::info!(
            frames = total,
            overlays = self.overlays.len(),
            width = self.dims.width,
            height = self.dims.height,
            workers,
            quality = speed,
            "Starting export"
        );
        report(&progress, ExportStage::Preparing, 0, total as u64);

        let plan: Arc<[FrameComposition]> = plan_compositions(&self.frames, &self.overlays).into();
        let (tx, rx) = mpsc::channel::<(usize, gif::Frame<'static>)>();

        let writer = {
            let abort = self.abort.clone();
            let dims = self.dims;
            tokio::task::spawn_blocking(move || write_gif(rx, dims, total, &abort, progress))
        };

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let ctx = WorkerContext {
                worker,
                stride: workers,
                speed,
                frames: Arc::clone(&self.frames),
                overlays: Arc::clone(&self.overlays),
                plan: Arc::clone(&plan),
                dims: self.dims,
                catalog: Arc::clone(&self.catalog),
                fonts: Arc::clone(&self.fonts),
                abort: self.abort.clone(),
                tx: tx.clone(),
            };
            handles.push(tokio::task::spawn_blocking(move || ctx.run()));
        }
        drop(tx);

        let mut worker_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    worker_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Export worker panicked");
                    worker_error.get_or_insert(EncodeError::Aborted);
                }
            }
        }
        let written = writer.await.map_err(|_| EncodeError::Aborted)?;

        let bytes = match (worker_error, written) {
            (Some(e), _) | (None, Err(e)) => {
                tracing::warn!(error = %e, "Export failed");
                return Err(e);
            }
            (None, Ok(bytes)) => bytes,
        };

        let created_at_ms = unique_unix_millis();
        let result = RenderResult {
            bytes,
            file_name: export_file_name(created_at_ms),
            created_at_ms,
        };
        tracing::info!(
            file = %result.file_name,
            bytes = result.bytes.len(),
            "Export complete"
        );
        Ok(result)
    }
}

struct WorkerContext {
    worker: usize,
    stride: usize,
    speed: i32,
    frames: Arc<[Frame]>,
    overlays: Arc<[OverlayItem]>,
    plan: Arc<[FrameComposition]>,
    dims: Dimensions,
    catalog: Arc<TemplateCatalog>,
    fonts: Arc<FontBook>,
    abort: AbortHandle,
    tx: mpsc::Sender<(usize, gif::Frame<'static>)>,
}

impl WorkerContext {
    fn run(self) -> Result<(), EncodeError> {
        let mut painter = TextPainter::new(&self.fonts);
        let width = self.dims.width as u16;
        let height = self.dims.height as u16;

        for composition in self.plan.iter().skip(self.worker).step_by(self.stride) {
            if self.abort.is_aborted() {
                return Ok(());
            }
            let frame = &self.frames[composition.frame_index];
            let overlays: Vec<&OverlayItem> = composition
                .overlays
                .iter()
                .map(|&i| &self.overlays[i])
                .collect();

            let mut rgba =
                composite_frame(frame, &overlays, self.dims, &self.catalog, &mut painter)?;
            let mut encoded = gif::Frame::from_rgba_speed(width, height, &mut rgba, self.speed);
            encoded.delay = (composition.delay_ms / 10).min(u64::from(u16::MAX)) as u16;
            encoded.dispose = DisposalMethod::Background;

            if self.tx.send((composition.frame_index, encoded)).is_err() {
                // Writer has stopped; it reports why.
                return Ok(());
            }
        }
        tracing::debug!(worker = self.worker, "Export worker finished");
        Ok(())
    }
}

fn write_gif(
    rx: mpsc::Receiver<(usize, gif::Frame<'static>)>,
    dims: Dimensions,
    total: usize,
    abort: &AbortHandle,
    progress: Option<ProgressCallback>,
) -> Result<Vec<u8>, EncodeError> {
    let result = encode_in_order(rx, dims, total, abort, &progress);
    match &result {
        Ok(_) => report(&progress, ExportStage::Complete, total as u64, total as u64),
        Err(_) => report(&progress, ExportStage::Failed, 0, total as u64),
    }
    result
}

fn encode_in_order(
    rx: mpsc::Receiver<(usize, gif::Frame<'static>)>,
    dims: Dimensions,
    total: usize,
    abort: &AbortHandle,
    progress: &Option<ProgressCallback>,
) -> Result<Vec<u8>, EncodeError> {
    let backend = |e: gif::EncodingError| EncodeError::backend(e.to_string());
    let mut encoder = Encoder::new(Vec::new(), dims.width as u16, dims.height as u16, &[])
        .map_err(backend)?;
    encoder.set_repeat(Repeat::Infinite).map_err(backend)?;

    let mut pending = BTreeMap::new();
    let mut next = 0usize;
    while next < total {
        if abort.is_aborted() {
            return Err(EncodeError::Aborted);
        }
        let Ok((index, frame)) = rx.recv() else {
            break;
        };
        pending.insert(index, frame);
        while let Some(frame) = pending.remove(&next) {
            encoder.write_frame(&frame).map_err(backend)?;
            next += 1;
            report(progress, ExportStage::Rendering, next as u64, total as u64);
        }
    }

    if abort.is_aborted() || next < total {
        return Err(EncodeError::Aborted);
    }
    report(progress, ExportStage::Finalizing, next as u64, total as u64);
    encoder
        .into_inner()
        .map_err(|e| EncodeError::backend(e.to_string()))
}
