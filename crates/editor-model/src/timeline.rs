//! Playback timeline derived from frame delays.
//!
//! The timeline is never stored with the document. It is rebuilt from the
//! frame delays whenever frames change: a table of contiguous
//! `[start, end)` ranges covering `[0, total)`, a cursor in milliseconds,
//! and a play flag.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Cumulative display range of one frame, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpan {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl FrameSpan {
    /// Whether `t` lies in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_ms as f64 && t < self.end_ms as f64
    }

    pub fn delay_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Frame-offset table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOffsets {
    spans: Vec<FrameSpan>,
}

impl FrameOffsets {
    pub fn from_delays(delays: impl IntoIterator<Item = u32>) -> Self {
        let mut acc = 0u64;
        let spans = delays
            .into_iter()
            .map(|delay| {
                let start_ms = acc;
                acc += u64::from(delay);
                FrameSpan {
                    start_ms,
                    end_ms: acc,
                }
            })
            .collect();
        Self { spans }
    }

    pub fn from_frames(frames: &[Frame]) -> Self {
        Self::from_delays(frames.iter().map(Frame::delay_ms))
    }

    pub fn spans(&self) -> &[FrameSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn total_ms(&self) -> u64 {
        self.spans.last().map_or(0, |span| span.end_ms)
    }

    /// Index of the frame shown at `t`: the first range containing it, or
    /// the last frame when none does. `None` only without frames.
    pub fn frame_at(&self, t: f64) -> Option<usize> {
        if self.spans.is_empty() {
            return None;
        }
        let index = self
            .spans
            .iter()
            .position(|span| span.contains(t))
            .unwrap_or(self.spans.len() - 1);
        Some(index)
    }
}

/// Cursor, play state and frame resolution for the loaded document.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    offsets: FrameOffsets,
    current_ms: f64,
    playing: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from `frames`: cursor to 0, paused.
    pub fn load(&mut self, frames: &[Frame]) {
        self.offsets = FrameOffsets::from_frames(frames);
        self.current_ms = 0.0;
        self.playing = false;
    }

    /// Drop all frames. Playback stops.
    pub fn clear(&mut self) {
        self.offsets = FrameOffsets::default();
        self.current_ms = 0.0;
        self.playing = false;
    }

    /// Start playback. Refused (returns `false`) when the total duration is
    /// zero, since there is nothing to loop over.
    pub fn play(&mut self) -> bool {
        if self.total_duration_ms() == 0 {
            self.playing = false;
            return false;
        }
        self.playing = true;
        true
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Set the cursor directly, clamped to `[0, total]`. Play state is kept.
    pub fn seek(&mut self, t_ms: f64) {
        let total = self.total_duration_ms() as f64;
        self.current_ms = if t_ms.is_nan() {
            0.0
        } else {
            t_ms.clamp(0.0, total)
        };
    }

    pub fn reset(&mut self) {
        self.current_ms = 0.0;
    }

    /// Advance the cursor by a wall-clock delta while playing, wrapping
    /// modulo the total duration. Returns whether the cursor moved.
    pub fn advance(&mut self, delta: Duration) -> bool {
        let total = self.total_duration_ms() as f64;
        if !self.playing || total <= 0.0 {
            return false;
        }
        let next = self.current_ms + delta.as_secs_f64() * 1000.0;
        self.current_ms = next % total;
        true
    }

    pub fn current_ms(&self) -> f64 {
        self.current_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.offsets.total_ms()
    }

    pub fn offsets(&self) -> &FrameOffsets {
        &self.offsets
    }

    /// Frame shown at the cursor.
    pub fn current_frame_index(&self) -> Option<usize> {
        self.offsets.frame_at(self.current_ms)
    }
}

/// Render milliseconds as seconds with two decimals, e.g. `1.25s`.
pub fn format_duration(ms: f64) -> String {
    format!("{:.2}s", ms / 1000.0)
}
