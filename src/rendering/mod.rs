//! Render backends for the spectrogram mesh.
//!
//! The driver only talks to [`MeshRenderer`]: the windowed app uses the wgpu
//! backend, headless runs rasterize the height field into PNG snapshots.

#[cfg(test)]
pub(crate) mod fake;
mod gpu;
mod headless;

pub use gpu::{GpuRenderer, ViewUniforms};
pub use headless::HeadlessRenderer;

use crate::error::RenderError;
use crate::params::SpectrogramParameters;
use crate::spectrogram::{Palette, SpectrogramGeometry};

/// Real-time view parameters (never require a geometry rebuild)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    pub zoom: f32,
    /// Height of a full-scale (255) vertex, world units
    pub max_height: f32,
    pub xsize: f32,
    pub ysize: f32,
}

impl From<&SpectrogramParameters> for ViewParams {
    fn from(params: &SpectrogramParameters) -> Self {
        Self {
            zoom: params.zoom,
            max_height: params.max_height,
            xsize: params.xsize,
            ysize: params.ysize,
        }
    }
}

/// Draw target for one geometry instance at a time
pub trait MeshRenderer {
    /// Replace any previous mesh with `geometry` (positions, indices, heights)
    fn upload_geometry(&mut self, geometry: &SpectrogramGeometry) -> Result<(), RenderError>;

    /// Push the per-vertex displacement attribute; same length as the uploaded mesh
    fn push_heights(&mut self, heights: &[u8]);

    fn set_view(&mut self, view: ViewParams);

    fn set_palette(&mut self, palette: &Palette);

    /// Draw one frame with the current mesh; no-op without a mesh
    fn draw_frame(&mut self) -> Result<(), RenderError>;

    /// Drop the mesh and per-geometry resources; safe to call repeatedly
    fn release(&mut self);
}

/// Convert byte heights to the normalized displacement attribute
pub fn displacement(heights: &[u8], out: &mut Vec<f32>) {
    out.clear();
    out.extend(heights.iter().map(|&h| h as f32 / 255.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displacement_normalizes_bytes() {
        let mut out = vec![7.0; 10];
        displacement(&[0, 51, 255], &mut out);
        assert_eq!(out, vec![0.0, 0.2, 1.0]);
    }

    #[test]
    fn test_view_params_from_spectrogram_parameters() {
        let params = SpectrogramParameters {
            zoom: 2.5,
            max_height: 12.0,
            ..Default::default()
        };
        let view = ViewParams::from(&params);
        assert_eq!(view.zoom, 2.5);
        assert_eq!(view.max_height, 12.0);
        assert_eq!(view.xsize, params.xsize);
        assert_eq!(view.ysize, params.ysize);
    }
}
