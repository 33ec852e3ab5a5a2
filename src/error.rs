//! Error taxonomy of a capture call

use thiserror::Error;

use crate::domain::ImageFormat;

pub type Result<T, E = CaptureError> = std::result::Result<T, E>;

/// Every way a capture call can fail.
///
/// Stopping early because scrolling no longer makes progress is not an error;
/// it only marks the last frame as final.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No capture target selected")]
    NoTarget,

    #[error("Capture target '{0}' is not attached to the page")]
    TargetNotFound(String),

    #[error("Capture of frame {frame} failed: {message}")]
    Acquisition { frame: usize, message: String },

    #[error("Captured frame {frame} could not be decoded: {message}")]
    InvalidFrame { frame: usize, message: String },

    #[error("Nothing to capture: the target has no visible area")]
    EmptyCapture,

    #[error("Encoding {format} output failed: {message}")]
    Encoding { format: ImageFormat, message: String },
}

impl CaptureError {
    pub fn acquisition(frame: usize, err: &anyhow::Error) -> Self {
        Self::Acquisition {
            frame,
            message: format!("{err:#}"),
        }
    }

    pub fn invalid_frame(frame: usize, message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            frame,
            message: message.into(),
        }
    }

    pub fn encoding(format: ImageFormat, message: impl ToString) -> Self {
        Self::Encoding {
            format,
            message: message.to_string(),
        }
    }
}
