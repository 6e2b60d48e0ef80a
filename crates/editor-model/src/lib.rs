//! AddTextGif Editor Model
//!
//! Defines the core data contracts of the captioning editor:
//! - **Frames:** Decoded, immutable GIF frames and the document that owns them
//! - **Timeline:** Cursor, play state, and delay-derived frame ranges
//! - **Overlays:** Time-bounded text items with clamped positions
//! - **Templates:** The static catalog of caption styles
//!
//! Overlay positions are normalized to `[0.0, 1.0]` relative to the frame
//! dimensions so they survive any preview scaling.

pub mod color;
pub mod frame;
pub mod overlay;
pub mod position;
pub mod template;
pub mod timeline;

pub use color::*;
pub use frame::*;
pub use overlay::*;
pub use position::*;
pub use template::*;
pub use timeline::*;
