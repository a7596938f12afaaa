//! Spectrogram height field: grid geometry, scroll updater and color mapping.

mod color;
mod mesh;
mod scroll;

// Re-export public types
pub use color::{color_for, ColorScheme, Palette, Rgb, DARK_THRESHOLD};
pub use mesh::{frequency_axis_y, SpectrogramGeometry, Vertex};
pub use scroll::scroll_tick;
