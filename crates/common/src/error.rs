//! Error types shared across AddTextGif crates.
//!
//! The pipeline has two failure families: decoding an uploaded GIF and
//! encoding an export. Both are recoverable at the editor boundary; the
//! editor stays usable and the user may retry immediately.

/// Failure to turn uploaded bytes into a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("File is not a GIF image")]
    Signature,

    #[error("Invalid GIF: {message}")]
    Malformed { message: String },

    #[error("GIF has zero width or height")]
    ZeroDimensions,

    #[error("GIF contains no frames")]
    NoFrames,
}

impl DecodeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed {
            message: msg.into(),
        }
    }
}

/// Failure to produce an export.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("No frames to render")]
    NoFrames,

    #[error("aborted")]
    Aborted,

    #[error("Frame size {width}x{height} exceeds the GIF limit of 65535")]
    FrameTooLarge { width: u32, height: u32 },

    #[error("GIF encoding failed: {message}")]
    Backend { message: String },
}

impl EncodeError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            message: msg.into(),
        }
    }
}

/// Top-level error type for editor operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Editor is busy: {operation} in progress")]
    Busy { operation: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using EditorError.
pub type EditorResult<T> = Result<T, EditorError>;

impl EditorError {
    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy {
            operation: operation.into(),
        }
    }

    /// Whether the user can simply try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Encode(_) | Self::Busy { .. })
    }
}
