//! Parameter definitions with units and documented semantics.
//!
//! All tunables live here with:
//! - Units (world units, Hz, dB, milliseconds)
//! - Documented ranges and meanings
//! - Validation where the core must not trust its caller

mod analyzer;
mod camera;
pub mod control;
mod render;
mod spectrogram;

// Re-export all types
pub use analyzer::{fft_size_for, AnalyzerConfig, MAX_FFT_SIZE, MIN_FFT_SIZE};
pub use camera::CameraRig;
pub use render::{RecordingConfig, RenderConfig};
pub use spectrogram::SpectrogramParameters;
