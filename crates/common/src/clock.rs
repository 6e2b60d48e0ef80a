//! Clock and timing utilities for playback and export naming.
//!
//! Playback advances by wall-clock delta, not by frame steps. This module
//! provides:
//! - A tick clock that reports the delta between successive refresh ticks
//! - The interval for the scheduled playback callback
//! - Unique millisecond stamps for export file names

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Measures wall-clock time between successive playback ticks.
///
/// The first tick after creation or [`PlaybackClock::stop`] only anchors
/// the clock and reports a zero delta.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    last_tick: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self { last_tick: None }
    }

    /// Record a tick at `now` and return the time since the previous one.
    pub fn tick(&mut self, now: Instant) -> Duration {
        let delta = match self.last_tick {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        delta
    }

    /// Cancel the schedule. The next tick re-anchors.
    pub fn stop(&mut self) {
        self.last_tick = None;
    }

    /// Whether the clock has been anchored by a tick.
    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Convert a duration to fractional milliseconds.
    pub fn duration_to_ms(duration: Duration) -> f64 {
        duration.as_secs_f64() * 1000.0
    }
}

/// Interval between refresh ticks at `target_hz`.
pub fn refresh_interval(target_hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(target_hz.max(1)))
}

static LAST_EXPORT_STAMP: AtomicI64 = AtomicI64::new(0);

/// Unix milliseconds for an export, strictly increasing within the process
/// so two exports in the same millisecond still get distinct names.
pub fn unique_unix_millis() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_EXPORT_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_EXPORT_STAMP.compare_exchange_weak(
            last,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_anchors() {
        let mut clock = PlaybackClock::new();
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0), Duration::ZERO);
        assert_eq!(
            clock.tick(t0 + Duration::from_millis(16)),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn test_stop_reanchors() {
        let mut clock = PlaybackClock::new();
        let t0 = Instant::now();
        clock.tick(t0);
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.tick(t0 + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_duration_to_ms() {
        let ms = PlaybackClock::duration_to_ms(Duration::from_micros(1500));
        assert!((ms - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_refresh_interval() {
        assert_eq!(refresh_interval(60), Duration::from_nanos(16_666_666));
        assert_eq!(refresh_interval(0), Duration::from_secs(1));
    }

    #[test]
    fn test_unique_stamps_increase() {
        let a = unique_unix_millis();
        let b = unique_unix_millis();
        assert!(b > a);
    }
}
