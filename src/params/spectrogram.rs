//! Spectrogram geometry and display parameters.

use crate::error::SessionError;
use crate::spectrogram::ColorScheme;

/// Parameters describing one spectrogram instance
///
/// `time_samples`, `frequency_samples`, `xsize` and `ysize` are structural: they fix
/// the vertex grid, so changing any of them forces a full geometry rebuild.
/// `zoom`, `max_height` and `color_scheme` are real-time and apply on the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramParameters {
    /// Number of time columns kept on screen (grid has one extra closing column)
    pub time_samples: usize,

    /// Number of analyzer bins shown along the frequency axis
    pub frequency_samples: usize,

    /// Extent of the time axis (world units)
    pub xsize: f32,

    /// Extent of the frequency axis (world units, also the base of the log scale)
    pub ysize: f32,

    /// Camera zoom factor (1.0 = default framing, larger = closer)
    pub zoom: f32,

    /// Height of a full-scale (255) bin (world units)
    pub max_height: f32,

    /// Intensity-to-color mapping
    pub color_scheme: ColorScheme,
}

impl Default for SpectrogramParameters {
    fn default() -> Self {
        Self {
            time_samples: 600,
            frequency_samples: 256,
            xsize: 40.0,
            ysize: 20.0,
            zoom: 1.0,
            max_height: 6.0,
            color_scheme: ColorScheme::Rainbow,
        }
    }
}

impl SpectrogramParameters {
    /// Reject sizes the geometry builder cannot work with
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.time_samples == 0 {
            return Err(SessionError::InvalidParameters(
                "time samples must be > 0".to_string(),
            ));
        }
        if self.frequency_samples == 0 {
            return Err(SessionError::InvalidParameters(
                "frequency samples must be > 0".to_string(),
            ));
        }
        if !(self.xsize.is_finite() && self.xsize > 0.0) {
            return Err(SessionError::InvalidParameters(format!(
                "xsize must be > 0, got {}",
                self.xsize
            )));
        }
        if !(self.ysize.is_finite() && self.ysize > 0.0) {
            return Err(SessionError::InvalidParameters(format!(
                "ysize must be > 0, got {}",
                self.ysize
            )));
        }
        let vertices = self
            .frequency_samples
            .checked_add(1)
            .zip(self.time_samples.checked_add(1))
            .and_then(|(rows, columns)| rows.checked_mul(columns))
            .and_then(|count| u32::try_from(count).ok());
        let indices = self
            .frequency_samples
            .checked_mul(self.time_samples)
            .and_then(|quads| quads.checked_mul(6))
            .and_then(|count| u32::try_from(count).ok());
        if vertices.is_none() || indices.is_none() {
            return Err(SessionError::InvalidParameters(format!(
                "{} x {} grid does not fit 32-bit indices",
                self.time_samples, self.frequency_samples
            )));
        }
        Ok(())
    }

    /// Whether moving from `self` to `other` invalidates the current geometry
    pub fn requires_rebuild(&self, other: &SpectrogramParameters) -> bool {
        self.time_samples != other.time_samples
            || self.frequency_samples != other.frequency_samples
            || self.xsize != other.xsize
            || self.ysize != other.ysize
    }

    /// Number of vertices in the grid built from these parameters
    ///
    /// Saturates for sets that `validate` rejects.
    pub fn vertex_count(&self) -> usize {
        self.frequency_samples
            .saturating_add(1)
            .saturating_mul(self.time_samples.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(SpectrogramParameters::default().validate().is_ok());
    }

    #[test]
    fn test_non_positive_sizes_rejected() {
        let base = SpectrogramParameters::default();

        let cases = [
            SpectrogramParameters {
                time_samples: 0,
                ..base.clone()
            },
            SpectrogramParameters {
                frequency_samples: 0,
                ..base.clone()
            },
            SpectrogramParameters {
                xsize: 0.0,
                ..base.clone()
            },
            SpectrogramParameters {
                ysize: -3.0,
                ..base.clone()
            },
            SpectrogramParameters {
                ysize: f32::NAN,
                ..base.clone()
            },
        ];

        for params in cases {
            assert!(matches!(
                params.validate(),
                Err(SessionError::InvalidParameters(_))
            ));
        }
    }

    #[test]
    fn test_rebuild_only_for_structural_changes() {
        let base = SpectrogramParameters::default();

        let realtime = SpectrogramParameters {
            zoom: 2.5,
            max_height: 1.0,
            color_scheme: ColorScheme::Fire,
            ..base.clone()
        };
        assert!(!base.requires_rebuild(&realtime));

        let structural = SpectrogramParameters {
            frequency_samples: 128,
            ..base.clone()
        };
        assert!(base.requires_rebuild(&structural));

        let resized = SpectrogramParameters {
            xsize: 10.0,
            ..base
        };
        assert!(SpectrogramParameters::default().requires_rebuild(&resized));
    }

    #[test]
    fn test_vertex_count() {
        let params = SpectrogramParameters {
            time_samples: 200,
            frequency_samples: 64,
            ..Default::default()
        };
        assert_eq!(params.vertex_count(), 65 * 201);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let huge = SpectrogramParameters {
            time_samples: 100_000_000,
            frequency_samples: 64,
            ..Default::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(SessionError::InvalidParameters(_))
        ));

        let overflowing = SpectrogramParameters {
            time_samples: usize::MAX,
            ..Default::default()
        };
        assert_eq!(overflowing.vertex_count(), usize::MAX);
        assert!(matches!(
            overflowing.validate(),
            Err(SessionError::InvalidParameters(_))
        ));
    }
}
