//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::audio::SourceRequest;
use crate::params::control::{self, parse_frequency_samples, parse_time_samples};
use crate::params::{RecordingConfig, SpectrogramParameters};
use crate::spectrogram::ColorScheme;

/// Which source to connect at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Microphone capture
    Mic,
    /// WAV stream from --url
    Radio,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Spectroscape")]
#[command(about = "Real-time scrolling 3D spectrogram", long_about = None)]
pub struct Args {
    /// Source to connect at startup (windowed mode waits for a key otherwise)
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Radio stream: http(s) URL or path of an uncompressed WAV stream
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Input device name (host default when omitted)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Frequency bins per column (64..=512, step 64)
    #[arg(long, value_name = "N", default_value = "256", value_parser = parse_frequency_samples)]
    pub frequency_samples: usize,

    /// Columns of history (200..=1200, step 100)
    #[arg(long, value_name = "N", default_value = "600", value_parser = parse_time_samples)]
    pub time_samples: usize,

    /// Surface extent along the time axis (world units)
    #[arg(long, default_value = "40")]
    pub xsize: f32,

    /// Surface extent along the frequency axis (world units)
    #[arg(long, default_value = "20")]
    pub ysize: f32,

    /// Camera zoom factor
    #[arg(long, default_value = "1")]
    pub zoom: f32,

    /// Height of a full-scale bin (world units)
    #[arg(long, default_value = "6")]
    pub max_height: f32,

    /// Color scheme: rainbow, fire, grayscale, ocean, sunset, forest, ice, neon,
    /// crimson, emerald, azure
    #[arg(long, value_name = "SCHEME", default_value = "rainbow")]
    pub color_scheme: ColorScheme,

    /// Run without a window and write PNG snapshots instead
    #[arg(long)]
    pub headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value = "600")]
    pub frames: u64,

    /// Snapshot directory for headless mode
    #[arg(long, value_name = "DIR", default_value = "output/frames")]
    pub record_dir: PathBuf,
}

impl Args {
    /// Spectrogram parameters from the command line, slider values clamped
    pub fn spectrogram_parameters(&self) -> SpectrogramParameters {
        SpectrogramParameters {
            time_samples: self.time_samples,
            frequency_samples: self.frequency_samples,
            xsize: self.xsize,
            ysize: self.ysize,
            zoom: control::clamp_zoom(self.zoom),
            max_height: control::clamp_max_height(self.max_height),
            color_scheme: self.color_scheme,
        }
    }

    pub fn microphone_request(&self) -> SourceRequest {
        SourceRequest::Microphone {
            device: self.device.clone(),
        }
    }

    /// Radio request if a URL was given
    pub fn radio_request(&self) -> Option<SourceRequest> {
        self.url.as_deref().map(SourceRequest::radio)
    }

    /// Source to connect at startup
    pub fn startup_request(&self) -> Result<Option<SourceRequest>, String> {
        match self.source {
            None => Ok(None),
            Some(SourceKind::Mic) => Ok(Some(self.microphone_request())),
            Some(SourceKind::Radio) => self
                .radio_request()
                .map(Some)
                .ok_or_else(|| "--source radio needs --url".to_string()),
        }
    }

    /// Headless snapshot configuration
    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig::new(&self.record_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["spectroscape"]).unwrap();
        let params = args.spectrogram_parameters();

        assert_eq!(params, SpectrogramParameters::default());
        assert!(!args.headless);
        assert_eq!(args.startup_request(), Ok(None));
    }

    #[test]
    fn test_sliders_reject_off_grid_values() {
        assert!(Args::try_parse_from(["spectroscape", "--frequency-samples", "100"]).is_err());
        assert!(Args::try_parse_from(["spectroscape", "--frequency-samples", "1024"]).is_err());
        assert!(Args::try_parse_from(["spectroscape", "--time-samples", "250"]).is_err());

        let args =
            Args::try_parse_from(["spectroscape", "--frequency-samples", "512", "--time-samples", "1200"])
                .unwrap();
        assert_eq!(args.frequency_samples, 512);
        assert_eq!(args.time_samples, 1200);
    }

    #[test]
    fn test_color_scheme_flag() {
        let args = Args::try_parse_from(["spectroscape", "--color-scheme", "ice"]).unwrap();
        assert_eq!(args.color_scheme, ColorScheme::Ice);
        assert!(Args::try_parse_from(["spectroscape", "--color-scheme", "plaid"]).is_err());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let args = Args::try_parse_from(["spectroscape", "--zoom", "50"]).unwrap();
        assert_eq!(args.spectrogram_parameters().zoom, 10.0);
    }

    #[test]
    fn test_startup_source() {
        let args = Args::try_parse_from(["spectroscape", "--source", "mic", "--device", "USB Mic"])
            .unwrap();
        assert_eq!(
            args.startup_request(),
            Ok(Some(SourceRequest::Microphone {
                device: Some("USB Mic".to_string())
            }))
        );

        let args = Args::try_parse_from(["spectroscape", "--source", "radio"]).unwrap();
        assert!(args.startup_request().is_err());

        let args = Args::try_parse_from([
            "spectroscape",
            "--source",
            "radio",
            "--url",
            "http://radio.example/live.wav",
        ])
        .unwrap();
        assert_eq!(
            args.startup_request(),
            Ok(Some(SourceRequest::radio("http://radio.example/live.wav")))
        );
    }
}
