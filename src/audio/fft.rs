//! Frequency analyzer: windowed FFT over the sample tap, smoothed and scaled to bytes.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::SampleTap;
use crate::error::SessionError;
use crate::params::AnalyzerConfig;

/// Anything that yields one spectrum column per render tick
pub trait SpectrumSource {
    /// Latest spectrum: `frequency_samples` intensities in 0..=255
    ///
    /// Must not block. When nothing new is available the previous column is
    /// returned again.
    fn sample(&mut self) -> &[u8];
}

/// FFT analyzer bound to one source's sample tap
pub struct FrequencyAnalyzer {
    config: AnalyzerConfig,
    tap: SampleTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes, one per bin up to Nyquist
    smoothed: Vec<f32>,
    /// Last byte column handed out
    bytes: Vec<u8>,
    last_seen: u64,
}

impl FrequencyAnalyzer {
    /// Create an analyzer reading from `tap`
    pub fn new(config: AnalyzerConfig, tap: SampleTap) -> Result<Self, SessionError> {
        config
            .validate()
            .map_err(|e| SessionError::InvalidParameters(format!("Invalid analyzer config: {}", e)))?;

        let n = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        log::debug!(
            "Analyzer: fft_size={} bins={} smoothing={} @ {}Hz, top bin {:.0}Hz",
            n,
            config.frequency_samples,
            config.smoothing,
            tap.sample_rate(),
            config.bin_to_hz(config.frequency_samples.saturating_sub(1), tap.sample_rate())
        );

        Ok(Self {
            window: (0..n).map(|i| blackman_window(i, n)).collect(),
            time_domain: vec![0.0; n],
            spectrum: vec![Complex::new(0.0, 0.0); n],
            scratch,
            smoothed: vec![0.0; config.bin_count()],
            bytes: vec![0; config.frequency_samples],
            last_seen: 0,
            fft,
            tap,
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn tap(&self) -> &SampleTap {
        &self.tap
    }

    /// Smoothed linear magnitudes of the last analysis
    pub fn magnitudes(&self) -> &[f32] {
        &self.smoothed
    }

    /// Run one analysis if the tap has fresh samples; returns whether it did
    pub fn update(&mut self) -> bool {
        match self.tap.try_snapshot(&mut self.time_domain, self.last_seen) {
            Some(written) => {
                self.last_seen = written;
                self.analyze();
                true
            }
            None => false,
        }
    }

    fn analyze(&mut self) {
        let n = self.config.fft_size;

        for ((bin, &sample), &w) in self
            .spectrum
            .iter_mut()
            .zip(&self.time_domain)
            .zip(&self.window)
        {
            *bin = Complex::new(sample * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let tau = self.config.smoothing;
        let norm = 1.0 / n as f32;
        for (s, c) in self.smoothed.iter_mut().zip(&self.spectrum) {
            *s = tau * *s + (1.0 - tau) * c.norm() * norm;
        }

        let min_db = self.config.min_db;
        let scale = 255.0 / (self.config.max_db - min_db);
        for (j, byte) in self.bytes.iter_mut().enumerate() {
            *byte = match self.smoothed.get(j) {
                Some(&magnitude) => magnitude_to_byte(magnitude, min_db, scale),
                None => 0,
            };
        }
    }
}

impl SpectrumSource for FrequencyAnalyzer {
    fn sample(&mut self) -> &[u8] {
        self.update();
        &self.bytes
    }
}

fn magnitude_to_byte(magnitude: f32, min_db: f32, scale: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    ((db - min_db) * scale).clamp(0.0, 255.0) as u8
}

/// Blackman window function for FFT analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let x = index as f32 / size as f32;
    A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
}
