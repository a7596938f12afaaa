//! Session controller: one source, one analyzer, one geometry at a time.

use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{AudioSource, FrequencyAnalyzer, SourceId, SourceProvider, SourceRequest};
use crate::driver::{DriverState, RenderDriver};
use crate::error::SessionError;
use crate::params::{AnalyzerConfig, SpectrogramParameters};
use crate::rendering::MeshRenderer;

/// Owns the active source and drives the renderer on its behalf
pub struct SessionController<P: SourceProvider, R: MeshRenderer> {
    provider: P,
    driver: RenderDriver<R>,
    params: SpectrogramParameters,
    source: Option<Box<dyn AudioSource>>,
    analyzer: Option<FrequencyAnalyzer>,
    last_error: Option<SessionError>,
}

impl<P: SourceProvider, R: MeshRenderer> SessionController<P, R> {
    pub fn new(provider: P, renderer: R, params: SpectrogramParameters) -> Self {
        Self {
            provider,
            driver: RenderDriver::new(renderer, params.clone()),
            params,
            source: None,
            analyzer: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn params(&self) -> &SpectrogramParameters {
        &self.params
    }

    pub fn driver(&self) -> &RenderDriver<R> {
        &self.driver
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.driver.renderer_mut()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Identity of the connected source
    pub fn source_id(&self) -> Option<&SourceId> {
        self.source.as_ref().map(|s| s.id())
    }

    /// Most recent failure, for display
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    fn record<T>(&mut self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(e) = &result {
            log::error!("{}", e);
            self.last_error = Some(e.clone());
        }
        result
    }

    /// Connect `request` and start drawing, replacing any active source
    ///
    /// Re-requesting the connected source is refused and keeps the binding.
    pub fn activate(&mut self, request: &SourceRequest) -> Result<(), SessionError> {
        let id = request.source_id();
        if self.source_id() == Some(&id) && self.source.as_ref().is_some_and(|s| s.is_live()) {
            log::info!("{} is already connected", id);
            return Err(SessionError::AlreadyConnected(id));
        }

        // Full teardown of the previous source before the new one starts
        self.stop();

        self.driver.begin_start();
        let result = self.start_source(request);
        if result.is_err() {
            self.stop();
        }
        self.record(result)
    }

    fn start_source(&mut self, request: &SourceRequest) -> Result<(), SessionError> {
        let source = self.provider.acquire(request)?;
        let analyzer = FrequencyAnalyzer::new(
            AnalyzerConfig::for_frequency_samples(self.params.frequency_samples),
            source.tap().clone(),
        );
        // Hold the source first so a failure below still releases it
        self.source = Some(source);
        self.analyzer = Some(analyzer?);

        self.driver.finish_start(&self.params)?;
        self.last_error = None;
        Ok(())
    }

    /// Tear down the session; safe to call in any state
    pub fn stop(&mut self) {
        self.driver.begin_stop();
        self.analyzer = None;
        if let Some(mut source) = self.source.take() {
            source.release();
        }
        self.driver.finish_stop();
    }

    /// Run one tick if the session is running; returns whether it did
    pub fn on_frame(&mut self) -> bool {
        if let Some(source) = &self.source {
            if !source.is_live() {
                let id = source.id().clone();
                log::warn!("Lost {}", id);
                self.stop();
                self.last_error = Some(SessionError::SourceLost(id));
                return false;
            }
        }

        match self.analyzer.as_mut() {
            Some(analyzer) => self.driver.tick(analyzer),
            None => false,
        }
    }

    /// Apply new parameters
    ///
    /// Invalid sets are rejected and change nothing. Real-time fields apply at
    /// once; structural changes rebuild the geometry (and the analyzer when the
    /// bin count changes) while the source stays connected.
    pub fn update_parameters(&mut self, new: SpectrogramParameters) -> Result<(), SessionError> {
        let validated = new.validate();
        self.record(validated)?;

        let structural = self.params.requires_rebuild(&new);
        let bins_changed = self.params.frequency_samples != new.frequency_samples;
        self.params = new;
        self.driver.apply_realtime(&self.params);

        if !structural || self.driver.state() != DriverState::Running {
            return Ok(());
        }

        log::info!(
            "Rebuilding spectrogram: {} time x {} frequency samples",
            self.params.time_samples,
            self.params.frequency_samples
        );
        self.driver.begin_stop();
        self.driver.finish_stop();

        let result = self.rebuild(bins_changed);
        if result.is_err() {
            self.stop();
        }
        self.record(result)
    }

    fn rebuild(&mut self, bins_changed: bool) -> Result<(), SessionError> {
        if bins_changed {
            let tap = match &self.source {
                Some(source) => source.tap().clone(),
                None => return Ok(()),
            };
            self.analyzer = None;
            self.analyzer = Some(FrequencyAnalyzer::new(
                AnalyzerConfig::for_frequency_samples(self.params.frequency_samples),
                tap,
            )?);
        }
        self.driver.begin_start();
        self.driver.finish_start(&self.params)
    }

    /// Paced loop for headless runs; returns the number of ticks that ran
    ///
    /// Stops early when the session leaves Running (source lost, stop).
    pub fn run_frames(&mut self, frames: u64, interval: Duration) -> u64 {
        let mut ticks = 0;
        for _ in 0..frames {
            let started = Instant::now();
            if self.on_frame() {
                ticks += 1;
            }
            if self.state() != DriverState::Running {
                break;
            }
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }
        ticks
    }
}

impl<P: SourceProvider, R: MeshRenderer> Drop for SessionController<P, R> {
    fn drop(&mut self) {
        self.stop();
    }
}
