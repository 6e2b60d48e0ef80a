//! AddTextGif Common Utilities
//!
//! Shared infrastructure for all AddTextGif crates:
//! - Decode/encode error taxonomy and result aliases
//! - Playback clock utilities
//! - Tracing/logging initialization
//! - Configuration loading and display locales

pub mod clock;
pub mod config;
pub mod error;
pub mod locale;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use locale::*;
