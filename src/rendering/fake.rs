//! Recording renderer for driver and session tests.

use super::{MeshRenderer, ViewParams};
use crate::error::RenderError;
use crate::spectrogram::{ColorScheme, Palette, SpectrogramGeometry};

#[derive(Debug, Default)]
pub struct FakeRenderer {
    pub uploads: usize,
    pub pushes: usize,
    pub draws: usize,
    pub releases: usize,
    pub vertex_count: Option<usize>,
    pub heights: Vec<u8>,
    pub view: Option<ViewParams>,
    pub palette: Option<ColorScheme>,
    pub fail_draws: bool,
}

impl MeshRenderer for FakeRenderer {
    fn upload_geometry(&mut self, geometry: &SpectrogramGeometry) -> Result<(), RenderError> {
        self.uploads += 1;
        self.vertex_count = Some(geometry.vertex_count());
        self.heights = geometry.heights().to_vec();
        Ok(())
    }

    fn push_heights(&mut self, heights: &[u8]) {
        self.pushes += 1;
        self.heights = heights.to_vec();
    }

    fn set_view(&mut self, view: ViewParams) {
        self.view = Some(view);
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette = Some(palette.scheme);
    }

    fn draw_frame(&mut self) -> Result<(), RenderError> {
        if self.fail_draws {
            return Err(RenderError::Frame("surface lost".to_string()));
        }
        self.draws += 1;
        Ok(())
    }

    fn release(&mut self) {
        if self.vertex_count.take().is_some() {
            self.releases += 1;
        }
    }
}
