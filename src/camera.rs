//! Orbit camera framing the spectrogram surface.

use glam::{Mat4, Vec3};

use crate::params::{CameraRig, RenderConfig};
use crate::rendering::ViewParams;

/// Camera orbiting the center of the surface at a fixed angle
///
/// Zoom moves the eye along its view ray; nothing else about the framing
/// changes at runtime.
pub struct OrbitCamera {
    rig: CameraRig,
}

impl OrbitCamera {
    pub fn new(rig: CameraRig) -> Self {
        Self { rig }
    }

    /// Distance from eye to target for the given view
    pub fn distance(&self, view: &ViewParams) -> f32 {
        let (min_zoom, max_zoom) = self.rig.zoom_range;
        let zoom = view.zoom.clamp(min_zoom, max_zoom);
        let extent = view.xsize.max(view.ysize);
        extent * self.rig.distance_factor / zoom
    }

    /// Compute camera position and look-at target
    ///
    /// # Returns
    /// Tuple of (eye_position, target_position)
    pub fn compute_position_and_target(&self, view: &ViewParams) -> (Vec3, Vec3) {
        let target = Vec3::new(0.0, 0.0, view.max_height * self.rig.target_height_fraction);

        let distance = self.distance(view);
        let elevation = self.rig.elevation_deg.to_radians();
        let azimuth = self.rig.azimuth_deg.to_radians();

        // Horizontal viewing direction; azimuth 0 looks along +Y
        let forward = Vec3::new(azimuth.sin(), azimuth.cos(), 0.0);
        let eye = target - forward * (distance * elevation.cos())
            + Vec3::Z * (distance * elevation.sin());

        (eye, target)
    }

    /// Create view-projection matrix for rendering
    ///
    /// Heights point along +Z, so Z is the up vector.
    pub fn create_view_proj_matrix(
        &self,
        view: &ViewParams,
        render_config: &RenderConfig,
        aspect_ratio: f32,
    ) -> Mat4 {
        let (eye, target) = self.compute_position_and_target(view);
        let view_matrix = Mat4::look_at_rh(eye, target, Vec3::Z);

        // Keep the whole surface inside the frustum at any zoom
        let extent = view.xsize.max(view.ysize) + view.max_height;
        let far = render_config.far_plane.max(self.distance(view) + extent * 2.0);
        let proj = Mat4::perspective_rh(
            render_config.fov_degrees.to_radians(),
            aspect_ratio,
            render_config.near_plane,
            far,
        );

        proj * view_matrix
    }
}
