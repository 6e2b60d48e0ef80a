//! AddTextGif Render Engine
//!
//! Decodes uploaded GIFs into full-size frames and burns caption overlays
//! back into them on export.
//!
//! # Pipeline Architecture
//!
//! ```text
//! upload.gif ── decode ── Document (frames + delays)
//!                              │
//! overlays ────────────────────┼── plan: overlays per frame interval
//!                              │
//!                              ├── worker 0 ─┐  composite + quantise
//!                              ├── worker 1 ─┤
//!                              │             ▼
//!                              └──────── ordered writer ── addtextgif-<ms>.gif
//! ```

pub mod compositor;
pub mod decode;
pub mod export;
pub mod raster;
pub mod text;

pub use compositor::{composite_frame, composite_preview, plan_compositions, FrameComposition};
pub use decode::{decode, decode_blocking};
pub use export::*;
pub use text::{FontBook, FontError};
