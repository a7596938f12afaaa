//! Spectroscape library - real-time scrolling 3D spectrogram

pub mod audio;
pub mod camera;
pub mod cli;
pub mod driver;
pub mod error;
pub mod params;
pub mod rendering;
pub mod session;
pub mod spectrogram;
