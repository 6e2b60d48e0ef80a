//! AddTextGif Editor
//!
//! The single-document editing session: owns the decoded GIF, drives the
//! playback cursor, holds the overlays, and runs exports.

pub mod session;

pub use session::*;
