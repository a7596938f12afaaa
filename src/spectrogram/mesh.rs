//! Spectrogram grid mesh: vertex positions, triangle indices and the heights buffer.

use bytemuck::{Pod, Zeroable};

use crate::error::SessionError;
use crate::params::SpectrogramParameters;

/// Vertex data for the spectrogram mesh (flat position, z is displaced on the GPU)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// One geometry instance: fixed grid, fixed triangulation, mutable heights
///
/// Everything is created together and dropped together; a structural parameter
/// change builds a new instance instead of patching this one.
#[derive(Debug, Clone)]
pub struct SpectrogramGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// One intensity per vertex, same row-major layout as `vertices`
    heights: Vec<u8>,
    time_samples: usize,
    frequency_samples: usize,
}

impl SpectrogramGeometry {
    /// Build the grid for the given parameters
    ///
    /// Layout is row-major by time: `index = time_index * (F + 1) + freq_index`.
    /// x is linear in time, y is logarithmic in frequency, z starts at 0.
    pub fn build(params: &SpectrogramParameters) -> Result<Self, SessionError> {
        params.validate()?;

        let time_samples = params.time_samples;
        let frequency_samples = params.frequency_samples;
        let stride = frequency_samples + 1;
        let vertex_count = params.vertex_count();

        let mut vertices = Vec::with_capacity(vertex_count);

        let x_step = params.xsize / time_samples as f32;
        let x_half = params.xsize / 2.0;

        // Frequency rows do not depend on time, compute them once
        let rows: Vec<f32> = (0..=frequency_samples)
            .map(|j| frequency_axis_y(j, frequency_samples, params.ysize))
            .collect();

        for i in 0..=time_samples {
            let x = i as f32 * x_step - x_half;
            for &y in &rows {
                vertices.push(Vertex {
                    position: [x, y, 0.0],
                });
            }
        }

        // Two triangles per quad, winding (a, b, d) + (b, c, d)
        let mut indices = Vec::with_capacity(time_samples * frequency_samples * 6);
        for i in 0..time_samples {
            for j in 0..frequency_samples {
                let a = (i * stride + (j + 1)) as u32;
                let b = (i * stride + j) as u32;
                let c = ((i + 1) * stride + j) as u32;
                let d = ((i + 1) * stride + (j + 1)) as u32;

                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        log::debug!(
            "Built spectrogram grid: {}x{} ({} vertices, {} triangles)",
            time_samples + 1,
            stride,
            vertex_count,
            indices.len() / 3
        );

        Ok(Self {
            vertices,
            indices,
            heights: vec![0; vertex_count],
            time_samples,
            frequency_samples,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Current intensities; only `push_column` writes them
    pub fn heights(&self) -> &[u8] {
        &self.heights
    }

    pub fn time_samples(&self) -> usize {
        self.time_samples
    }

    pub fn frequency_samples(&self) -> usize {
        self.frequency_samples
    }

    /// Vertices per time column
    pub fn stride(&self) -> usize {
        self.frequency_samples + 1
    }

    /// Heights of one time column (0 = oldest, `time_samples` = newest)
    pub fn column(&self, time_index: usize) -> &[u8] {
        let stride = self.stride();
        &self.heights[time_index * stride..(time_index + 1) * stride]
    }

    /// Advance the scroll by one column using the newest analyzer sample
    pub fn push_column(&mut self, sample: &[u8]) {
        let vertex_count = self.vertex_count();
        super::scroll::scroll_tick(
            sample,
            &mut self.heights,
            self.frequency_samples,
            vertex_count,
        );
    }
}

/// Logarithmic y coordinate of frequency row `j`
///
/// `p = ((F - j) / F) * ln(ysize)`, `y = -e^p + ysize / 2 + 1`. Row 0 (lowest bin)
/// lands at `1 - ysize / 2` with the widest spacing; rows compress exponentially
/// toward `ysize / 2` as frequency rises.
pub fn frequency_axis_y(j: usize, frequency_samples: usize, ysize: f32) -> f32 {
    let ymax = ysize.ln();
    let yhalf = ysize / 2.0;
    let p = ((frequency_samples - j) as f32 / frequency_samples as f32) * ymax;
    -p.exp() + yhalf + 1.0
}
