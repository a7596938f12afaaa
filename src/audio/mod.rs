//! Audio acquisition and frequency analysis.
//!
//! Sources (microphone capture, radio playback) run on cpal/reader threads and
//! publish mono samples into a [`SampleTap`]. The render thread only ever reads
//! the tap through a [`FrequencyAnalyzer`], without blocking.

mod fft;
mod microphone;
mod provider;
mod radio;
mod tap;

use std::fmt;

use crate::error::SessionError;

// Re-export public types
pub use fft::{blackman_window, FrequencyAnalyzer, SpectrumSource};
pub use microphone::MicrophoneSource;
pub use provider::DeviceSourceProvider;
pub use radio::{RadioSource, WavStream};
pub use tap::SampleTap;

/// Identity of a connected source
///
/// Two requests with the same identity would bind the same external audio graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// Input device by name (`default` for the host default)
    Microphone(String),

    /// Stream URL or file path
    Radio(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Microphone(device) => write!(f, "microphone '{}'", device),
            SourceId::Radio(url) => write!(f, "radio '{}'", url),
        }
    }
}

/// What the user asked to listen to
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRequest {
    /// Capture from an input device (raw, without echo cancellation)
    Microphone { device: Option<String> },

    /// Play and analyze an uncompressed WAV stream (http(s) URL or file path)
    Radio { url: String },
}

impl SourceRequest {
    pub fn microphone() -> Self {
        SourceRequest::Microphone { device: None }
    }

    pub fn radio(url: impl Into<String>) -> Self {
        SourceRequest::Radio { url: url.into() }
    }

    /// Identity the resulting source will carry
    pub fn source_id(&self) -> SourceId {
        match self {
            SourceRequest::Microphone { device } => {
                SourceId::Microphone(device.clone().unwrap_or_else(|| "default".to_string()))
            }
            SourceRequest::Radio { url } => SourceId::Radio(url.trim().to_string()),
        }
    }
}

/// A connected audio source feeding a sample tap
pub trait AudioSource {
    fn id(&self) -> &SourceId;

    /// Shared tap the analyzer reads from
    fn tap(&self) -> &SampleTap;

    /// False once the source has stopped delivering audio (stream error, EOF)
    fn is_live(&self) -> bool {
        self.tap().is_live()
    }

    /// Disconnect and free the underlying streams; safe to call repeatedly
    fn release(&mut self);
}

/// Opens sources on request
pub trait SourceProvider {
    fn acquire(&mut self, request: &SourceRequest) -> Result<Box<dyn AudioSource>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_identity() {
        assert_eq!(
            SourceRequest::microphone().source_id(),
            SourceId::Microphone("default".to_string())
        );
        assert_eq!(
            SourceRequest::radio(" http://radio.example/live.wav ").source_id(),
            SourceRequest::radio("http://radio.example/live.wav").source_id()
        );
        assert_ne!(
            SourceRequest::radio("a.wav").source_id(),
            SourceRequest::radio("b.wav").source_id()
        );
    }

    #[test]
    fn test_source_id_display() {
        let id = SourceId::Radio("http://radio.example/live.wav".to_string());
        assert_eq!(id.to_string(), "radio 'http://radio.example/live.wav'");
    }
}
