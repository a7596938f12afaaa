//! Rendering and snapshot configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view at zoom 1.0 (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Background clear color (linear RGB)
    pub clear_color: [f64; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 500.0,
            clear_color: [0.01, 0.01, 0.02],
        }
    }
}

/// Headless snapshot configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Output directory for snapshot frames
    pub output_dir: PathBuf,

    /// Frame rate the headless loop is paced at (FPS)
    pub fps: u32,

    /// Write a snapshot every this many frames (0 = only the last frame)
    pub snapshot_every: u64,
}

impl RecordingConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fps: 60,
            snapshot_every: 60,
        }
    }

    /// Interval between paced frames
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    /// Frame file path
    pub fn frame_path(&self, frame_num: u64) -> PathBuf {
        self.output_dir.join(format!("frame_{:05}.png", frame_num))
    }

    /// Whether the given frame should be written out
    pub fn should_snapshot(&self, frame_num: u64) -> bool {
        self.snapshot_every > 0 && frame_num % self.snapshot_every == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_path_is_zero_padded() {
        let config = RecordingConfig::new("out");
        assert_eq!(config.frame_path(42), PathBuf::from("out/frame_00042.png"));
    }

    #[test]
    fn test_snapshot_cadence() {
        let mut config = RecordingConfig::new("out");
        config.snapshot_every = 30;
        assert!(config.should_snapshot(0));
        assert!(!config.should_snapshot(29));
        assert!(config.should_snapshot(60));

        config.snapshot_every = 0;
        assert!(!config.should_snapshot(0));
    }
}
