use std::sync::Arc;

use anyhow::Result;

use crate::coords::ViewportSize;

use super::{CoordinatorConfig, FrameRenderable, RenderCoordinator, Surface};

type SharedLoader<S> = Arc<dyn Fn(&S) -> Result<()> + Send + Sync>;

/// Control-thread owner of a surface and its render coordinator.
///
/// Forwards surface notifications (resize, close) to the coordinator and
/// tracks the latest viewport so a restarted render thread begins at the
/// current size.
pub struct SurfaceOwner<S: Surface> {
    // Declared first so the render thread is joined before the surface is released.
    coordinator: Option<RenderCoordinator<S>>,
    surface: Arc<S>,
    config: CoordinatorConfig,
    loader: Option<SharedLoader<S>>,
    viewport: ViewportSize,
}

impl<S: Surface> SurfaceOwner<S> {
    pub fn new(surface: Arc<S>, config: CoordinatorConfig) -> Self {
        let viewport = config.initial_viewport;
        Self {
            coordinator: None,
            surface,
            config,
            loader: None,
            viewport,
        }
    }

    /// Sets the one-time GPU initialization step for every coordinator this owner starts.
    pub fn with_loader<L>(mut self, loader: L) -> Self
    where
        L: Fn(&S) -> Result<()> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn coordinator(&self) -> Option<&RenderCoordinator<S>> {
        self.coordinator.as_ref()
    }

    pub fn is_rendering(&self) -> bool {
        self.coordinator
            .as_ref()
            .is_some_and(RenderCoordinator::is_running)
    }

    /// Hands the context to a new render thread and starts it.
    ///
    /// Does nothing while a render thread is already running. A coordinator
    /// whose loop ended is replaced.
    pub fn start_thread<R, F>(&mut self, setup: F) -> Result<()>
    where
        F: FnOnce(&S) -> Result<R> + Send + 'static,
        R: FrameRenderable<S::Frame> + 'static,
    {
        if self.is_rendering() {
            return Ok(());
        }
        self.stop_thread();

        let config = CoordinatorConfig {
            initial_viewport: self.viewport,
            ..self.config.clone()
        };

        let mut coordinator = RenderCoordinator::new(&self.surface, config, setup);
        if let Some(loader) = &self.loader {
            let loader = Arc::clone(loader);
            coordinator = coordinator.with_loader(move |s: &S| loader(s));
        }

        coordinator.start()?;
        self.coordinator = Some(coordinator);
        Ok(())
    }

    /// Stops and releases the render coordinator, blocking until its thread exits.
    pub fn stop_thread(&mut self) {
        if let Some(mut coordinator) = self.coordinator.take() {
            coordinator.stop();
        }
    }

    /// Surface resize notification.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.viewport = ViewportSize::new(width, height);
        if let Some(coordinator) = &self.coordinator {
            coordinator.set_viewport_size(width, height);
        }
    }

    /// Surface close notification.
    pub fn on_close(&mut self) {
        self.stop_thread();
    }
}
