//! Spectroscape - a real-time scrolling 3D spectrogram
//!
//! Listen to the microphone or an internet radio stream and watch its spectrum
//! scroll across a 3D surface of frequency over time.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use spectroscape::audio::DeviceSourceProvider;
use spectroscape::cli::Args;
use spectroscape::error::SessionError;
use spectroscape::params::{control, CameraRig, RenderConfig, SpectrogramParameters};
use spectroscape::rendering::{GpuRenderer, HeadlessRenderer, MeshRenderer, ViewParams};
use spectroscape::session::SessionController;

type WindowSession = SessionController<DeviceSourceProvider, GpuRenderer>;

/// Main application state
struct App {
    args: Args,
    render_config: RenderConfig,
    window: Option<Arc<Window>>,
    session: Option<WindowSession>,
}

impl App {
    fn new(args: Args) -> Self {
        Self {
            args,
            render_config: RenderConfig::default(),
            window: None,
            session: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Spectroscape")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );

        let params = self.args.spectrogram_parameters();
        let renderer = pollster::block_on(GpuRenderer::new(
            Arc::clone(&window),
            self.render_config.clone(),
            CameraRig::default(),
            ViewParams::from(&params),
        ))?;

        let mut session = SessionController::new(DeviceSourceProvider::new(), renderer, params);
        match self.args.startup_request() {
            Ok(Some(request)) => report(session.activate(&request)),
            Ok(None) => {}
            Err(e) => log::warn!("{}", e),
        }

        log::info!("Spectroscape is running");
        log::info!("M: microphone  R: radio  S/Space: stop  C: color scheme  Esc: quit");
        log::info!("Up/Down: zoom  PageUp/PageDown: height  [ ]: frequency samples  - =: time samples");

        self.window = Some(window);
        self.session = Some(session);
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut params = session.params().clone();
        match code {
            KeyCode::Escape => {
                session.stop();
                event_loop.exit();
                return;
            }
            KeyCode::KeyM => {
                report(session.activate(&self.args.microphone_request()));
                return;
            }
            KeyCode::KeyR => {
                match self.args.radio_request() {
                    Some(request) => report(session.activate(&request)),
                    None => log::warn!("No radio stream configured, start with --url"),
                }
                return;
            }
            KeyCode::KeyS | KeyCode::Space => {
                session.stop();
                return;
            }
            KeyCode::KeyC => params.color_scheme = params.color_scheme.next(),
            KeyCode::ArrowUp => params.zoom = control::clamp_zoom(params.zoom * 1.1),
            KeyCode::ArrowDown => params.zoom = control::clamp_zoom(params.zoom / 1.1),
            KeyCode::PageUp => params.max_height = control::clamp_max_height(params.max_height + 1.0),
            KeyCode::PageDown => {
                params.max_height = control::clamp_max_height(params.max_height - 1.0)
            }
            KeyCode::BracketLeft => {
                params.frequency_samples =
                    control::FREQUENCY_SAMPLES.step_from(params.frequency_samples, -1)
            }
            KeyCode::BracketRight => {
                params.frequency_samples =
                    control::FREQUENCY_SAMPLES.step_from(params.frequency_samples, 1)
            }
            KeyCode::Minus => {
                params.time_samples = control::TIME_SAMPLES.step_from(params.time_samples, -1)
            }
            KeyCode::Equal => {
                params.time_samples = control::TIME_SAMPLES.step_from(params.time_samples, 1)
            }
            _ => return,
        }
        apply_parameters(session, params);
    }
}

fn apply_parameters(session: &mut WindowSession, params: SpectrogramParameters) {
    if &params != session.params() {
        // Errors are recorded and logged by the session
        let _ = session.update_parameters(params);
    }
}

/// Log the outcome of a user-triggered activation
fn report(result: Result<(), SessionError>) {
    match result {
        Ok(()) => {}
        Err(SessionError::AlreadyConnected(id)) => log::info!("Already listening to {}", id),
        // Everything else was already logged by the session
        Err(e) => log::debug!("Activation failed: {}", e),
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Startup failed: {:#}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(session) = self.session.as_mut() {
                    session.stop();
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::Resized(size) => {
                if let Some(session) = self.session.as_mut() {
                    session.renderer_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(session) = self.session.as_mut() {
                    // Keep clearing the surface while no source is running
                    if !session.on_frame() {
                        if let Err(e) = session.renderer_mut().draw_frame() {
                            log::debug!("Idle frame skipped: {}", e);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Run the session without a window, writing PNG snapshots
fn run_headless(args: &Args) -> anyhow::Result<()> {
    let recording = args.recording_config();
    let interval = recording.frame_interval();
    let output_dir = recording.output_dir.clone();

    let request = args
        .startup_request()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_else(|| args.microphone_request());

    let renderer = HeadlessRenderer::new(recording)?;
    let mut session =
        SessionController::new(DeviceSourceProvider::new(), renderer, args.spectrogram_parameters());
    session
        .activate(&request)
        .with_context(|| format!("failed to start {}", request.source_id()))?;

    log::info!(
        "Headless run: {} frames into {}",
        args.frames,
        output_dir.display()
    );
    let ticks = session.run_frames(args.frames, interval);
    session.renderer_mut().snapshot()?;

    if let Some(e) = session.last_error() {
        log::warn!("Session ended early: {}", e);
    }
    session.stop();

    let renderer = session.renderer_mut();
    log::info!(
        "Headless run finished: {} frames, {} snapshots",
        ticks,
        renderer.written().len()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.headless {
        return run_headless(&args);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args);
    event_loop.run_app(&mut app)?;
    Ok(())
}
