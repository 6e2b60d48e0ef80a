//! User-authored text overlays and the in-memory store that owns them.
//!
//! Every overlay carries a millisecond window and a normalized anchor. The
//! store re-clamps both on every update, so callers can forward raw UI
//! values. Insertion order is preserved and doubles as the draw order:
//! later overlays paint on top of earlier ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::position::{clamp_coordinate, NormalizedPoint};

/// Shortest window an overlay may have, in milliseconds.
pub const MIN_OVERLAY_WINDOW_MS: u64 = 100;

/// Window length given to new overlays when the GIF is long enough.
pub const DEFAULT_OVERLAY_WINDOW_MS: u64 = 4_000;

/// Lower bound on the window length given to new overlays.
pub const MIN_INITIAL_WINDOW_MS: u64 = 500;

/// Stand-in total used for clamping when the document has no duration.
pub const ZERO_DURATION_FALLBACK_MS: u64 = 1_000;

/// Stable overlay identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(Uuid);

impl OverlayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OverlayId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A text element with a time window and a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayItem {
    id: OverlayId,
    text: String,
    start_ms: u64,
    end_ms: u64,
    x: f64,
    y: f64,
    template_id: String,
}

impl OverlayItem {
    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn position(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.x, self.y)
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// Live-preview test: `start <= t <= end`.
    pub fn is_active_at(&self, t_ms: f64) -> bool {
        t_ms >= self.start_ms as f64 && t_ms <= self.end_ms as f64
    }

    /// Export test: the frame shown during `[elapsed, elapsed + delay)`
    /// intersects the overlay window. An overlay ending exactly where the
    /// frame starts is excluded.
    pub fn overlaps_frame(&self, elapsed_ms: u64, delay_ms: u64) -> bool {
        elapsed_ms + delay_ms > self.start_ms && elapsed_ms < self.end_ms
    }

    fn apply(&mut self, patch: OverlayPatch, total_duration_ms: u64) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(template_id) = patch.template_id {
            self.template_id = template_id;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }

        let start = patch.start_ms.unwrap_or(self.start_ms as i64);
        let end = patch.end_ms.unwrap_or(self.end_ms as i64);
        let (start, end) = clamp_window(start, end, total_duration_ms);
        self.start_ms = start;
        self.end_ms = end;
        self.x = clamp_coordinate(self.x);
        self.y = clamp_coordinate(self.y);
    }
}

/// Partial changes to an overlay. Unset fields are left alone.
///
/// Times are signed so raw UI input (including negative values) can be
/// passed through and clamped by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPatch {
    pub text: Option<String>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub template_id: Option<String>,
}

impl OverlayPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn window(start_ms: i64, end_ms: i64) -> Self {
        Self {
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
            ..Self::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: Some(template_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Clamp a window against the document duration.
///
/// `start` lands in `[0, max(total - 100, 0)]`, `end` in
/// `[start + 100, total]`; when `total` is 0 a 1000 ms stand-in is used.
pub fn clamp_window(start_ms: i64, end_ms: i64, total_duration_ms: u64) -> (u64, u64) {
    let safe_total = if total_duration_ms == 0 {
        ZERO_DURATION_FALLBACK_MS
    } else {
        total_duration_ms
    } as i64;
    let min_window = MIN_OVERLAY_WINDOW_MS as i64;

    let start = start_ms.max(0).min((safe_total - min_window).max(0));
    let end = (start + min_window).max(end_ms.min(safe_total));
    (start as u64, end as u64)
}

/// Ordered, in-memory collection of overlays for the loaded document.
#[derive(Debug, Clone, Default)]
pub struct OverlayStore {
    items: Vec<OverlayItem>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an overlay with the default window `[0, max(500, min(total, 4000))]`
    /// (a zero total counts as 4000) and the default caption anchor.
    ///
    /// Returns `None` without creating anything when no frames are loaded.
    pub fn add(
        &mut self,
        frames_loaded: bool,
        total_duration_ms: u64,
        text: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Option<OverlayId> {
        if !frames_loaded {
            return None;
        }
        let total = if total_duration_ms == 0 {
            DEFAULT_OVERLAY_WINDOW_MS
        } else {
            total_duration_ms
        };
        let anchor = NormalizedPoint::CAPTION_DEFAULT;
        let item = OverlayItem {
            id: OverlayId::new(),
            text: text.into(),
            start_ms: 0,
            end_ms: total.min(DEFAULT_OVERLAY_WINDOW_MS).max(MIN_INITIAL_WINDOW_MS),
            x: anchor.x,
            y: anchor.y,
            template_id: template_id.into(),
        };
        let id = item.id;
        tracing::debug!(overlay = %id, end_ms = item.end_ms, "Overlay added");
        self.items.push(item);
        Some(id)
    }

    /// Apply `patch` to overlay `id` and re-clamp it. Unknown ids are a
    /// silent no-op (the overlay may have been deleted while a UI event
    /// was in flight); the return value says whether anything was applied.
    pub fn update(&mut self, id: OverlayId, patch: OverlayPatch, total_duration_ms: u64) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.apply(patch, total_duration_ms);
                true
            }
            None => {
                tracing::debug!(overlay = %id, "Ignoring update for unknown overlay");
                false
            }
        }
    }

    /// Remove overlay `id`. Removing an absent id is not an error.
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: OverlayId) -> Option<&OverlayItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Overlays in insertion (draw) order.
    pub fn iter(&self) -> impl Iterator<Item = &OverlayItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[OverlayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Overlays visible in the live preview at `t_ms` (inclusive window).
    pub fn active_at(&self, t_ms: f64) -> impl Iterator<Item = &OverlayItem> {
        self.items.iter().filter(move |item| item.is_active_at(t_ms))
    }

    /// Overlays composited onto a frame shown during
    /// `[elapsed_ms, elapsed_ms + delay_ms)`.
    pub fn active_during_frame(
        &self,
        elapsed_ms: u64,
        delay_ms: u64,
    ) -> impl Iterator<Item = &OverlayItem> {
        self.items
            .iter()
            .filter(move |item| item.overlaps_frame(elapsed_ms, delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{POSITION_MAX, POSITION_MIN};
    use proptest::prelude::*;

    fn store_with_one(total: u64) -> (OverlayStore, OverlayId) {
        let mut store = OverlayStore::new();
        let id = store.add(true, total, "Hello", "classic").unwrap();
        (store, id)
    }

    #[test]
    fn test_add_requires_frames() {
        let mut store = OverlayStore::new();
        assert!(store.add(false, 1_000, "Hello", "classic").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_default_window_and_anchor() {
        let (store, id) = store_with_one(10_000);
        let item = store.get(id).unwrap();
        assert_eq!(item.start_ms(), 0);
        assert_eq!(item.end_ms(), 4_000);
        assert_eq!(item.position(), NormalizedPoint::new(0.5, 0.8));
        assert_eq!(item.template_id(), "classic");

        let (short, id) = store_with_one(450);
        assert_eq!(short.get(id).unwrap().end_ms(), 500);

        let (mid, id) = store_with_one(2_500);
        assert_eq!(mid.get(id).unwrap().end_ms(), 2_500);
    }

    #[test]
    fn test_update_clamps_window() {
        let (mut store, id) = store_with_one(2_000);
        assert!(store.update(id, OverlayPatch::window(-300, 9_000), 2_000));
        let item = store.get(id).unwrap();
        assert_eq!((item.start_ms(), item.end_ms()), (0, 2_000));

        store.update(id, OverlayPatch::window(1_990, 1_000), 2_000);
        let item = store.get(id).unwrap();
        assert_eq!((item.start_ms(), item.end_ms()), (1_900, 2_000));
    }

    #[test]
    fn test_update_enforces_minimum_window() {
        let (mut store, id) = store_with_one(2_000);
        store.update(id, OverlayPatch::window(500, 520), 2_000);
        let item = store.get(id).unwrap();
        assert_eq!((item.start_ms(), item.end_ms()), (500, 600));
    }

    #[test]
    fn test_update_with_zero_duration_uses_fallback() {
        let (mut store, id) = store_with_one(0);
        store.update(id, OverlayPatch::window(5_000, 8_000), 0);
        let item = store.get(id).unwrap();
        assert_eq!((item.start_ms(), item.end_ms()), (900, 1_000));
    }

    #[test]
    fn test_update_clamps_position() {
        let (mut store, id) = store_with_one(1_000);
        store.update(id, OverlayPatch::position(1.2, -0.4), 1_000);
        let item = store.get(id).unwrap();
        assert_eq!(item.position(), NormalizedPoint::new(POSITION_MAX, POSITION_MIN));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let (mut store, _) = store_with_one(1_000);
        let before = store.items().to_vec();
        assert!(!store.update(OverlayId::new(), OverlayPatch::text("x"), 1_000));
        assert_eq!(store.items(), before.as_slice());
    }

    #[test]
    fn test_update_text_and_template() {
        let (mut store, id) = store_with_one(1_000);
        store.update(id, OverlayPatch::text("Bye"), 1_000);
        store.update(id, OverlayPatch::template("minimal"), 1_000);
        let item = store.get(id).unwrap();
        assert_eq!(item.text(), "Bye");
        assert_eq!(item.template_id(), "minimal");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut once, id) = store_with_one(1_000);
        once.add(true, 1_000, "Other", "subtitle");
        let mut twice = once.clone();

        assert!(once.remove(id));
        assert!(twice.remove(id));
        assert!(!twice.remove(id));
        assert_eq!(once.items(), twice.items());
    }

    #[test]
    fn test_active_during_frame_overlap_rule() {
        let (mut store, id) = store_with_one(2_000);
        store.update(id, OverlayPatch::window(200, 800), 2_000);

        assert_eq!(store.active_during_frame(500, 200).count(), 1);
        assert_eq!(store.active_during_frame(800, 200).count(), 0);
        // Frame ending exactly at the window start is excluded too.
        assert_eq!(store.active_during_frame(100, 100).count(), 0);
    }

    #[test]
    fn test_active_at_is_inclusive() {
        let (mut store, id) = store_with_one(2_000);
        store.update(id, OverlayPatch::window(200, 800), 2_000);
        assert_eq!(store.active_at(200.0).count(), 1);
        assert_eq!(store.active_at(800.0).count(), 1);
        assert_eq!(store.active_at(800.5).count(), 0);
        assert_eq!(store.active_at(199.0).count(), 0);
    }

    #[test]
    fn test_insertion_order_is_draw_order() {
        let mut store = OverlayStore::new();
        let a = store.add(true, 1_000, "a", "classic").unwrap();
        let b = store.add(true, 1_000, "b", "classic").unwrap();
        let c = store.add(true, 1_000, "c", "classic").unwrap();
        store.update(a, OverlayPatch::text("a2"), 1_000);
        let order: Vec<_> = store.active_during_frame(0, 100).map(|i| i.id()).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_overlay_id_round_trips_through_string() {
        let id = OverlayId::new();
        let parsed: OverlayId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    fn arb_patch() -> impl Strategy<Value = OverlayPatch> {
        (
            prop::option::of(-5_000i64..20_000),
            prop::option::of(-5_000i64..20_000),
            prop::option::of(-2.0f64..3.0),
            prop::option::of(-2.0f64..3.0),
        )
            .prop_map(|(start_ms, end_ms, x, y)| OverlayPatch {
                start_ms,
                end_ms,
                x,
                y,
                ..OverlayPatch::default()
            })
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_after_every_update(
            total in 0u64..15_000,
            patches in prop::collection::vec(arb_patch(), 1..20),
        ) {
            let (mut store, id) = store_with_one(total);
            let safe_total = if total == 0 { ZERO_DURATION_FALLBACK_MS } else { total };
            for patch in patches {
                store.update(id, patch, total);
                let item = store.get(id).unwrap();
                prop_assert!(item.start_ms() + MIN_OVERLAY_WINDOW_MS <= item.end_ms());
                prop_assert!(item.end_ms() <= safe_total.max(MIN_OVERLAY_WINDOW_MS));
                let p = item.position();
                prop_assert!((POSITION_MIN..=POSITION_MAX).contains(&p.x));
                prop_assert!((POSITION_MIN..=POSITION_MAX).contains(&p.y));
            }
        }
    }
}
