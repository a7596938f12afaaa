//! Frequency analyzer configuration.

/// Smallest FFT window the analyzer will use (samples)
pub const MIN_FFT_SIZE: usize = 1 << 8;

/// Largest FFT window the analyzer will use (samples)
pub const MAX_FFT_SIZE: usize = 1 << 14;

/// FFT window size for a given number of displayed frequency bins
///
/// Four times oversampled, rounded to the nearest power of two, clamped to
/// [`MIN_FFT_SIZE`, `MAX_FFT_SIZE`].
pub fn fft_size_for(frequency_samples: usize) -> usize {
    if frequency_samples == 0 {
        return MIN_FFT_SIZE;
    }
    let exponent = (4.0 * frequency_samples as f64).log2().round();
    let size = 2f64.powf(exponent.min(MAX_FFT_SIZE.trailing_zeros() as f64)) as usize;
    size.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
}

/// FFT analysis configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// FFT window size (power of 2, derived from frequency samples)
    pub fft_size: usize,

    /// Number of bins handed to the scroll updater per tick
    pub frequency_samples: usize,

    /// Temporal smoothing between successive spectra (0 = none, <1)
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_db: f32,
}

impl AnalyzerConfig {
    /// Configuration for the given number of displayed bins
    pub fn for_frequency_samples(frequency_samples: usize) -> Self {
        Self {
            fft_size: fft_size_for(frequency_samples),
            frequency_samples,
            smoothing: 0.5,
            min_db: -100.0,
            max_db: -30.0,
        }
    }

    /// Number of usable bins the FFT produces (up to Nyquist)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Convert FFT bin index to its center frequency (Hz)
    pub fn bin_to_hz(&self, bin: usize, sample_rate_hz: u32) -> f32 {
        bin as f32 * sample_rate_hz as f32 / self.fft_size as f32
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!(
                "Smoothing must be in [0, 1), got {}",
                self.smoothing
            ));
        }
        if self.min_db >= self.max_db {
            return Err(format!(
                "Decibel range is empty: {} >= {}",
                self.min_db, self.max_db
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_size_derivation() {
        assert_eq!(fft_size_for(256), 1024);
        assert_eq!(fft_size_for(512), 2048);
        // 4 * 64 = 256 sits exactly on the lower clamp
        assert_eq!(fft_size_for(64), 256);
        assert_eq!(fft_size_for(16), MIN_FFT_SIZE);
        assert_eq!(fft_size_for(100), 512); // log2(400) ≈ 8.64 → 2^9
        assert_eq!(fft_size_for(100_000), MAX_FFT_SIZE);
    }

    #[test]
    fn test_default_config_is_valid() {
        for samples in (64..=512).step_by(64) {
            let config = AnalyzerConfig::for_frequency_samples(samples);
            assert!(config.validate().is_ok());
            assert!(config.bin_count() >= samples);
        }
    }

    #[test]
    fn test_bin_to_hz() {
        let config = AnalyzerConfig::for_frequency_samples(256);

        // 44100 Hz / 1024 ≈ 43.07 Hz per bin
        assert_eq!(config.bin_to_hz(0, 44_100), 0.0);
        assert!((config.bin_to_hz(1, 44_100) - 43.07).abs() < 0.01);
    }
}
