use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coordinator::{CoordinatorConfig, FrameRenderable, SurfaceOwner};
use crate::coords::ViewportSize;
use crate::device::{GpuFrame, GpuInit, GpuSurface};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub coordinator: CoordinatorConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "relay".to_string(),
            initial_size: LogicalSize::new(720.0, 576.0),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

/// Entry point for the runtime.
///
/// The event loop thread is the control thread: it owns the window and its
/// GPU surface and only forwards resize and close notifications. All drawing
/// happens on the render thread.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the window is closed.
    ///
    /// `setup` builds the frame renderable on the render thread. It may run
    /// more than once, since the render thread is restarted after a suspend.
    pub fn run<F, R>(config: RuntimeConfig, gpu_init: GpuInit, setup: F) -> Result<()>
    where
        F: Fn(&GpuSurface) -> Result<R> + Send + Sync + 'static,
        R: FrameRenderable<GpuFrame> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, setup);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct AppState<F> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    setup: Arc<F>,

    owner: Option<SurfaceOwner<GpuSurface>>,
    exit_requested: bool,
}

impl<F, R> AppState<F>
where
    F: Fn(&GpuSurface) -> Result<R> + Send + Sync + 'static,
    R: FrameRenderable<GpuFrame> + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, setup: F) -> Self {
        Self {
            config,
            gpu_init,
            setup: Arc::new(setup),
            owner: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn window_id(&self) -> Option<WindowId> {
        self.owner.as_ref().map(|o| o.surface().window().id())
    }

    fn create_surface_owner(&self, event_loop: &ActiveEventLoop) -> Result<SurfaceOwner<GpuSurface>> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let viewport = ViewportSize::from(window.inner_size());
        let surface = pollster::block_on(GpuSurface::new(window, self.gpu_init.clone()))
            .context("GPU initialization failed for window")?;

        let adapter = surface.adapter_info();
        log::info!("rendering on {} ({:?})", adapter.name, adapter.backend);

        let config = CoordinatorConfig {
            initial_viewport: viewport,
            ..self.config.coordinator.clone()
        };

        Ok(SurfaceOwner::new(Arc::new(surface), config))
    }

    fn start_rendering(&mut self) -> Result<()> {
        let Some(owner) = self.owner.as_mut() else {
            return Ok(());
        };
        let setup = Arc::clone(&self.setup);
        owner.start_thread(move |surface: &GpuSurface| setup(surface))
    }

    fn close_window(&mut self) {
        if let Some(mut owner) = self.owner.take() {
            owner.on_close();
            owner.surface().invalidate();
            log::info!("window closed");
        }
    }
}

impl<F, R> ApplicationHandler for AppState<F>
where
    F: Fn(&GpuSurface) -> Result<R> + Send + Sync + 'static,
    R: FrameRenderable<GpuFrame> + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if self.owner.is_none() {
            match self.create_surface_owner(event_loop) {
                Ok(owner) => self.owner = Some(owner),
                Err(e) => {
                    log::error!("failed to create initial window: {e:#}");
                    self.request_exit(event_loop);
                    return;
                }
            }
        }

        if let Err(e) = self.start_rendering() {
            log::error!("failed to start render thread: {e:#}");
            self.close_window();
            self.request_exit(event_loop);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(owner) = self.owner.as_mut() {
            owner.stop_thread();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        if self.window_id() != Some(window_id) {
            return;
        }
        let Some(owner) = self.owner.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.close_window();
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                owner.on_resize(new_size.width, new_size.height);
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = owner.surface().window().inner_size();
                owner.on_resize(new_size.width, new_size.height);
            }

            // Frames are produced continuously by the render thread.
            WindowEvent::RedrawRequested => {}

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.close_window();
    }
}
