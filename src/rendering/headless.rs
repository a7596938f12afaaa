//! Headless backend: rasterizes the height field top-down into PNG snapshots.

use std::path::PathBuf;

use super::{MeshRenderer, ViewParams};
use crate::error::RenderError;
use crate::params::RecordingConfig;
use crate::spectrogram::{ColorScheme, Palette, SpectrogramGeometry};

/// Grid shape plus the latest heights pushed by the driver
struct HeightField {
    time_samples: usize,
    frequency_samples: usize,
    heights: Vec<u8>,
}

/// Renderer without a window, for recording runs and CI machines
pub struct HeadlessRenderer {
    recording: RecordingConfig,
    palette: Palette,
    field: Option<HeightField>,
    frame: u64,
    written: Vec<PathBuf>,
}

impl HeadlessRenderer {
    /// Create the renderer and its output directory
    pub fn new(recording: RecordingConfig) -> Result<Self, RenderError> {
        std::fs::create_dir_all(&recording.output_dir).map_err(|e| {
            RenderError::Init(format!(
                "Failed to create {}: {}",
                recording.output_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            recording,
            palette: Palette::for_scheme(ColorScheme::default()),
            field: None,
            frame: 0,
            written: Vec::new(),
        })
    }

    /// Frames drawn so far
    pub fn frames_drawn(&self) -> u64 {
        self.frame
    }

    /// Snapshot files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Write the current height field as the next frame's snapshot
    pub fn snapshot(&mut self) -> Result<Option<PathBuf>, RenderError> {
        let Some(field) = &self.field else {
            return Ok(None);
        };

        let width = field.time_samples + 1;
        let height = field.frequency_samples + 1;
        let pixels = rasterize(
            &field.heights,
            field.time_samples,
            field.frequency_samples,
            &self.palette,
        );

        let path = self.recording.frame_path(self.frame);
        image::save_buffer(
            &path,
            &pixels,
            width as u32,
            height as u32,
            image::ColorType::Rgba8,
        )
        .map_err(|e| RenderError::Snapshot(format!("{}: {}", path.display(), e)))?;

        log::debug!("Saved snapshot {}", path.display());
        self.written.push(path.clone());
        Ok(Some(path))
    }
}

impl MeshRenderer for HeadlessRenderer {
    fn upload_geometry(&mut self, geometry: &SpectrogramGeometry) -> Result<(), RenderError> {
        self.field = Some(HeightField {
            time_samples: geometry.time_samples(),
            frequency_samples: geometry.frequency_samples(),
            heights: geometry.heights().to_vec(),
        });
        Ok(())
    }

    fn push_heights(&mut self, heights: &[u8]) {
        if let Some(field) = &mut self.field {
            if field.heights.len() == heights.len() {
                field.heights.copy_from_slice(heights);
            }
        }
    }

    fn set_view(&mut self, view: ViewParams) {
        // Top-down raster has no camera
        log::trace!("Headless view update ignored: {:?}", view);
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette = palette.clone();
    }

    fn draw_frame(&mut self) -> Result<(), RenderError> {
        if self.field.is_none() {
            return Ok(());
        }
        if self.recording.should_snapshot(self.frame) {
            self.snapshot()?;
        }
        self.frame += 1;
        Ok(())
    }

    fn release(&mut self) {
        if self.field.take().is_some() {
            log::debug!("Released headless height field after {} frames", self.frame);
        }
    }
}

/// RGBA8 image of the height field: time left to right, high frequencies on top
fn rasterize(
    heights: &[u8],
    time_samples: usize,
    frequency_samples: usize,
    palette: &Palette,
) -> Vec<u8> {
    let width = time_samples + 1;
    let height = frequency_samples + 1;
    let mut pixels = vec![0u8; width * height * 4];

    for i in 0..width {
        for j in 0..height {
            let value = heights.get(i * height + j).copied().unwrap_or(0);
            let [r, g, b, a] = palette.lookup(value);
            let row = frequency_samples - j;
            let offset = (row * width + i) * 4;
            pixels[offset..offset + 4].copy_from_slice(&[
                to_byte(r),
                to_byte(g),
                to_byte(b),
                to_byte(a),
            ]);
        }
    }
    pixels
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SpectrogramParameters;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("spectroscape-{}-{}", name, std::process::id()))
    }

    fn small_geometry() -> SpectrogramGeometry {
        SpectrogramGeometry::build(&SpectrogramParameters {
            time_samples: 2,
            frequency_samples: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rasterize_orientation() {
        let palette = Palette::for_scheme(ColorScheme::Grayscale);
        // T = 1, F = 1: columns [0, 255] and [0, 0]
        let pixels = rasterize(&[0, 255, 0, 0], 1, 1, &palette);
        assert_eq!(pixels.len(), 2 * 2 * 4);

        // Highest bin of the oldest column is the top-left pixel
        assert_eq!(&pixels[0..4], &[255, 255, 255, 255]);
        // Bottom row is the dark tint, never pure white
        assert_ne!(&pixels[8..12], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_snapshots_follow_cadence() {
        let dir = temp_dir("cadence");
        let mut recording = RecordingConfig::new(&dir);
        recording.snapshot_every = 2;

        let mut renderer = HeadlessRenderer::new(recording).unwrap();
        let mut geometry = small_geometry();
        renderer.upload_geometry(&geometry).unwrap();

        for _ in 0..5 {
            geometry.push_column(&[200]);
            renderer.push_heights(geometry.heights());
            renderer.draw_frame().unwrap();
        }

        assert_eq!(renderer.frames_drawn(), 5);
        assert_eq!(renderer.written().len(), 3); // frames 0, 2, 4
        assert!(renderer.written().iter().all(|p| p.exists()));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_release_stops_drawing() {
        let dir = temp_dir("release");
        let mut renderer = HeadlessRenderer::new(RecordingConfig::new(&dir)).unwrap();
        renderer.upload_geometry(&small_geometry()).unwrap();

        renderer.release();
        renderer.release();
        renderer.draw_frame().unwrap();

        assert_eq!(renderer.frames_drawn(), 0);
        assert!(renderer.written().is_empty());
        assert_eq!(renderer.snapshot().unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
