//! Session-scoped error types.
//!
//! Nothing here is fatal to the process: every variant is scoped to the current
//! session and recoverable by issuing another start action.

use thiserror::Error;

use crate::audio::SourceId;

/// Why a source could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquisitionFailure {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not found")]
    DeviceNotFound,

    #[error("device busy")]
    DeviceBusy,

    #[error("network failure")]
    Network,

    #[error("decode failure")]
    Decode,

    #[error("unsupported format")]
    Unsupported,

    /// Backend error that fits none of the kinds above
    #[error("audio backend error")]
    Backend,
}

/// Failures raised by a mesh renderer backend
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("renderer initialisation failed: {0}")]
    Init(String),

    #[error("frame could not be drawn: {0}")]
    Frame(String),

    #[error("snapshot could not be written: {0}")]
    Snapshot(String),
}

/// Errors surfaced to the user by the session controller
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("could not acquire audio source ({failure}): {message}")]
    SourceAcquisition {
        failure: AcquisitionFailure,
        message: String,
    },

    #[error("invalid spectrogram parameters: {0}")]
    InvalidParameters(String),

    #[error("source {0} is already connected")]
    AlreadyConnected(SourceId),

    #[error("source {0} stopped delivering audio")]
    SourceLost(SourceId),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl SessionError {
    pub fn acquisition(failure: AcquisitionFailure, message: impl Into<String>) -> Self {
        SessionError::SourceAcquisition {
            failure,
            message: message.into(),
        }
    }
}
