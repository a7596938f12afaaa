//! Render driver: lifecycle state machine and the per-frame tick.

use std::fmt;

use crate::audio::SpectrumSource;
use crate::error::SessionError;
use crate::params::SpectrogramParameters;
use crate::rendering::{MeshRenderer, ViewParams};
use crate::spectrogram::{Palette, SpectrogramGeometry};

/// Lifecycle of the draw loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No active source
    Idle,
    /// Source acquired, geometry not built yet
    Starting,
    /// Tick loop active
    Running,
    /// Teardown in progress
    Stopping,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DriverState::Idle => "idle",
            DriverState::Starting => "starting",
            DriverState::Running => "running",
            DriverState::Stopping => "stopping",
        };
        f.write_str(text)
    }
}

/// The next-frame callback chain as data
///
/// A tick only runs when one is pending, and rescheduling is refused once
/// cancelled, so a stop can never race a late reschedule.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    cancelled: bool,
}

impl FrameScheduler {
    /// Request the next tick; false if the chain was cancelled
    pub fn schedule(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume the pending tick, if any
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.pending = false;
    }

    /// Re-arm for a new session
    pub fn reset(&mut self) {
        self.cancelled = false;
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Owns the geometry, the renderer and the tick loop
pub struct RenderDriver<R: MeshRenderer> {
    state: DriverState,
    renderer: R,
    params: SpectrogramParameters,
    geometry: Option<SpectrogramGeometry>,
    scheduler: FrameScheduler,
    frames: u64,
}

impl<R: MeshRenderer> RenderDriver<R> {
    pub fn new(renderer: R, params: SpectrogramParameters) -> Self {
        Self {
            state: DriverState::Idle,
            renderer,
            params,
            geometry: None,
            scheduler: FrameScheduler::default(),
            frames: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn params(&self) -> &SpectrogramParameters {
        &self.params
    }

    pub fn geometry(&self) -> Option<&SpectrogramGeometry> {
        self.geometry.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Ticks run since the driver was created
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn transition(&mut self, next: DriverState) {
        log::debug!("Driver {} → {}", self.state, next);
        self.state = next;
    }

    /// Idle → Starting; false if a session is already in progress
    pub fn begin_start(&mut self) -> bool {
        if self.state != DriverState::Idle {
            return false;
        }
        self.transition(DriverState::Starting);
        true
    }

    /// Starting → Running: build and upload geometry, then schedule the first tick
    ///
    /// On failure the driver drops back to Idle with nothing allocated.
    pub fn finish_start(&mut self, params: &SpectrogramParameters) -> Result<(), SessionError> {
        if self.state != DriverState::Starting {
            return Err(SessionError::InvalidParameters(format!(
                "cannot start rendering while {}",
                self.state
            )));
        }

        let geometry = match SpectrogramGeometry::build(params) {
            Ok(geometry) => geometry,
            Err(e) => {
                self.transition(DriverState::Idle);
                return Err(e);
            }
        };
        if let Err(e) = self.renderer.upload_geometry(&geometry) {
            self.renderer.release();
            self.transition(DriverState::Idle);
            return Err(e.into());
        }

        self.params = params.clone();
        self.renderer.set_view(ViewParams::from(params));
        self.renderer
            .set_palette(&Palette::for_scheme(params.color_scheme));

        log::info!(
            "Spectrogram running: {} time x {} frequency samples",
            geometry.time_samples(),
            geometry.frequency_samples()
        );
        self.geometry = Some(geometry);
        self.scheduler.reset();
        self.scheduler.schedule();
        self.transition(DriverState::Running);
        Ok(())
    }

    /// One frame: sample → scroll → push heights → draw → reschedule
    ///
    /// Returns whether a tick ran. Draw failures are logged and the loop keeps
    /// going; the renderer is expected to recover on a later frame.
    pub fn tick(&mut self, source: &mut dyn SpectrumSource) -> bool {
        if self.state != DriverState::Running || !self.scheduler.take() {
            return false;
        }
        let Some(geometry) = self.geometry.as_mut() else {
            return false;
        };

        geometry.push_column(source.sample());
        self.renderer.push_heights(geometry.heights());
        if let Err(e) = self.renderer.draw_frame() {
            log::warn!("Render error: {}", e);
        }

        self.frames += 1;
        self.scheduler.schedule();
        true
    }

    /// Apply zoom, max height and color scheme without touching the geometry
    pub fn apply_realtime(&mut self, params: &SpectrogramParameters) {
        let scheme_changed = params.color_scheme != self.params.color_scheme;

        self.params.zoom = params.zoom;
        self.params.max_height = params.max_height;
        self.params.color_scheme = params.color_scheme;

        // Sizes only reach the camera once the matching geometry exists
        self.renderer.set_view(ViewParams::from(&self.params));
        if scheme_changed {
            log::info!("Color scheme: {}", params.color_scheme);
            self.renderer
                .set_palette(&Palette::for_scheme(params.color_scheme));
        }
    }

    /// Running/Starting → Stopping; cancels the pending tick
    pub fn begin_stop(&mut self) -> bool {
        match self.state {
            DriverState::Running | DriverState::Starting => {
                self.scheduler.cancel();
                self.transition(DriverState::Stopping);
                true
            }
            DriverState::Idle | DriverState::Stopping => false,
        }
    }

    /// Stopping → Idle; releases geometry and render resources
    pub fn finish_stop(&mut self) {
        if self.state != DriverState::Stopping {
            return;
        }
        self.geometry = None;
        self.renderer.release();
        self.transition(DriverState::Idle);
    }

    pub fn is_tick_pending(&self) -> bool {
        self.scheduler.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::fake::FakeRenderer;
    use crate::spectrogram::ColorScheme;

    /// Spectrum source that always returns the same column
    struct Constant(Vec<u8>);

    impl SpectrumSource for Constant {
        fn sample(&mut self) -> &[u8] {
            &self.0
        }
    }

    fn params() -> SpectrogramParameters {
        SpectrogramParameters {
            time_samples: 4,
            frequency_samples: 3,
            ..Default::default()
        }
    }

    fn running_driver() -> RenderDriver<FakeRenderer> {
        let mut driver = RenderDriver::new(FakeRenderer::default(), params());
        assert!(driver.begin_start());
        driver.finish_start(&params()).unwrap();
        driver
    }

    #[test]
    fn test_scheduler_cancellation() {
        let mut scheduler = FrameScheduler::default();
        assert!(scheduler.schedule());
        assert!(scheduler.take());
        assert!(!scheduler.take());

        scheduler.schedule();
        scheduler.cancel();
        assert!(!scheduler.is_pending());
        assert!(!scheduler.schedule());

        scheduler.reset();
        assert!(scheduler.schedule());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut driver = RenderDriver::new(FakeRenderer::default(), params());
        assert_eq!(driver.state(), DriverState::Idle);
        assert!(!driver.begin_stop());

        assert!(driver.begin_start());
        assert_eq!(driver.state(), DriverState::Starting);
        assert!(!driver.begin_start());

        driver.finish_start(&params()).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert!(driver.is_tick_pending());
        assert_eq!(driver.renderer().uploads, 1);
        assert_eq!(driver.renderer().palette, Some(ColorScheme::Rainbow));

        assert!(driver.begin_stop());
        assert_eq!(driver.state(), DriverState::Stopping);
        assert!(!driver.is_tick_pending());

        driver.finish_stop();
        assert_eq!(driver.state(), DriverState::Idle);
        assert!(driver.geometry().is_none());
        assert_eq!(driver.renderer().releases, 1);
    }

    #[test]
    fn test_tick_scrolls_and_draws() {
        let mut driver = running_driver();
        let mut source = Constant(vec![10, 20, 30]);

        assert!(driver.tick(&mut source));
        assert!(driver.tick(&mut source));

        let geometry = driver.geometry().unwrap();
        assert_eq!(geometry.column(4), &[10, 20, 30, 30]);
        assert_eq!(geometry.column(3), &[10, 20, 30, 30]);
        assert_eq!(geometry.column(2), &[0, 0, 0, 0]);

        let renderer = driver.renderer();
        assert_eq!(renderer.pushes, 2);
        assert_eq!(renderer.draws, 2);
        assert_eq!(renderer.heights, geometry.heights());
        assert_eq!(driver.frames(), 2);
    }

    #[test]
    fn test_no_tick_after_stop() {
        let mut driver = running_driver();
        let mut source = Constant(vec![1, 2, 3]);

        driver.begin_stop();
        assert!(!driver.tick(&mut source));
        driver.finish_stop();
        assert!(!driver.tick(&mut source));
        assert_eq!(driver.renderer().draws, 0);
    }

    #[test]
    fn test_draw_failure_keeps_loop_alive() {
        let mut driver = running_driver();
        driver.renderer_mut().fail_draws = true;
        let mut source = Constant(vec![5, 5, 5]);

        assert!(driver.tick(&mut source));
        assert!(driver.tick(&mut source));
        assert_eq!(driver.state(), DriverState::Running);
        assert!(driver.is_tick_pending());
    }

    #[test]
    fn test_invalid_geometry_returns_to_idle() {
        let mut driver = RenderDriver::new(FakeRenderer::default(), params());
        driver.begin_start();

        let bad = SpectrogramParameters {
            frequency_samples: 0,
            ..params()
        };
        let result = driver.finish_start(&bad);

        assert!(matches!(result, Err(SessionError::InvalidParameters(_))));
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.renderer().uploads, 0);
    }

    #[test]
    fn test_realtime_parameters_keep_geometry() {
        let mut driver = running_driver();
        let mut source = Constant(vec![9, 9, 9]);
        driver.tick(&mut source);

        let updated = SpectrogramParameters {
            zoom: 3.0,
            max_height: 15.0,
            color_scheme: ColorScheme::Ice,
            ..params()
        };
        driver.apply_realtime(&updated);

        let renderer = driver.renderer();
        assert_eq!(renderer.uploads, 1);
        assert_eq!(renderer.palette, Some(ColorScheme::Ice));
        let view = renderer.view.unwrap();
        assert_eq!(view.zoom, 3.0);
        assert_eq!(view.max_height, 15.0);
        assert_eq!(driver.geometry().unwrap().column(4), &[9, 9, 9, 9]);
        assert_eq!(driver.state(), DriverState::Running);
    }
}
