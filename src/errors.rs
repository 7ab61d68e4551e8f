// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the filter pipeline

use crate::frame::Resolution;
use std::fmt;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type alias for render-pass operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Top-level pipeline error type
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// A filter step could not process a frame (fatal for that frame only)
    Render(RenderError),
    /// Session lifecycle errors
    Session(SessionError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Render-pass errors
///
/// A render error discards the frame being processed; the pipeline stays
/// active and continues with the next frame.
#[derive(Debug, Clone)]
pub enum RenderError {
    /// A chain produced output whose dimensions no longer match the target buffer
    DimensionMismatch {
        expected: Resolution,
        actual: Resolution,
    },
    /// Scanline stride smaller than one row of pixels
    BadStride { stride: u32, width: u32 },
    /// Backing memory too small for the declared dimensions
    BufferTooSmall { needed: usize, actual: usize },
}

/// Session lifecycle errors
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Camera device could not be opened at session start (fatal for the session)
    DeviceOpenFailed(String),
    /// The device reported no supported preview resolutions
    NoPreviewResolution,
    /// Session start requested while not in the Uninitialized state
    AlreadyStarted,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Render(e) => write!(f, "Render error: {}", e),
            PipelineError::Session(e) => write!(f, "Session error: {}", e),
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Output dimensions {} do not match target {}",
                    actual, expected
                )
            }
            RenderError::BadStride { stride, width } => {
                write!(f, "Stride {} too small for width {} (BGRA)", stride, width)
            }
            RenderError::BufferTooSmall { needed, actual } => {
                write!(f, "Buffer holds {} bytes, {} required", actual, needed)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::DeviceOpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            SessionError::NoPreviewResolution => {
                write!(f, "Device reported no preview resolutions")
            }
            SessionError::AlreadyStarted => write!(f, "Session already started"),
        }
    }
}

impl std::error::Error for PipelineError {}
impl std::error::Error for RenderError {}
impl std::error::Error for SessionError {}

// Conversions from sub-errors to PipelineError
impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

impl From<SessionError> for PipelineError {
    fn from(err: SessionError) -> Self {
        PipelineError::Session(err)
    }
}

impl From<String> for PipelineError {
    fn from(msg: String) -> Self {
        PipelineError::Other(msg)
    }
}

impl From<&str> for PipelineError {
    fn from(msg: &str) -> Self {
        PipelineError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}
