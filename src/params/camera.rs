//! Camera framing for the spectrogram surface.

/// Fixed orbit framing around the spectrogram center
///
/// The surface lies in the XY plane with heights along +Z, so the rig orbits
/// around Z and looks down onto the field from the low-frequency edge.
#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Angle above the XY plane (degrees)
    pub elevation_deg: f32,

    /// Rotation around +Z, 0 = looking along +Y (degrees)
    pub azimuth_deg: f32,

    /// Eye distance at zoom 1.0, as a multiple of the larger surface extent
    pub distance_factor: f32,

    /// Height of the look-at point above the surface (fraction of max height)
    pub target_height_fraction: f32,

    /// Zoom is clamped into this range before use
    pub zoom_range: (f32, f32),
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            elevation_deg: 35.0,
            azimuth_deg: -20.0,
            distance_factor: 1.1,
            target_height_fraction: 0.25,
            zoom_range: (0.1, 10.0),
        }
    }
}
