use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;

use crate::coords::{ColorRgba, ViewportSize};
use crate::device::{ContextError, FrameError};
use crate::time::FrameClock;

use super::handoff::{self, HandoffAck};
use super::shared::SharedState;
use super::{Camera, FrameRenderable, Surface};

/// Upper bound on how long an idle loop sleeps before re-checking the surface.
const IDLE_POLL: Duration = Duration::from_millis(16);

pub(crate) type Renderable<S> = Box<dyn FrameRenderable<<S as Surface>::Frame>>;
pub(crate) type Setup<S> = Box<dyn FnOnce(&S) -> Result<Renderable<S>> + Send>;
pub(crate) type Loader<S> = Box<dyn FnOnce(&S) -> Result<()> + Send>;

/// Why the render loop ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum ExitReason {
    StopRequested,
    SurfaceGone,
    SetupFailed,
    ContextLost,
}

/// Everything the render thread needs, moved into it at spawn time.
pub(crate) struct Worker<S: Surface> {
    pub surface: Weak<S>,
    pub shared: Arc<SharedState>,
    pub frames: Arc<AtomicU64>,
    pub loader: Option<Loader<S>>,
    pub setup: Option<Setup<S>>,
    pub camera: Camera,
    pub clear_color: ColorRgba,
}

/// Keeps the context current for its lifetime; releases it on drop, unwinding included.
struct CurrentContext<'a, S: Surface>(&'a S);

impl<'a, S: Surface> CurrentContext<'a, S> {
    fn acquire(surface: &'a S) -> Result<Self, ContextError> {
        surface.make_current()?;
        Ok(Self(surface))
    }
}

impl<S: Surface> Drop for CurrentContext<'_, S> {
    fn drop(&mut self) {
        self.0.done_current();
    }
}

/// Thread-local loop state. Lives and dies on the render thread.
struct RenderLoop<S: Surface> {
    worker: Worker<S>,
    renderable: Option<Renderable<S>>,
    clock: FrameClock,
}

impl<S: Surface> Worker<S> {
    /// Render thread entry point.
    pub fn run(self, ack: Receiver<HandoffAck>) {
        if !handoff::await_transfer(&ack) {
            log::debug!("context hand-off aborted; render thread exiting");
            return;
        }

        log::info!("render loop started");

        let mut state = RenderLoop {
            worker: self,
            renderable: None,
            clock: FrameClock::new(),
        };

        let reason = loop {
            if let ControlFlow::Break(reason) = state.iterate() {
                break reason;
            }
        };

        let frames = state.worker.frames.load(Ordering::Relaxed);
        match reason {
            ExitReason::StopRequested => log::info!("render loop stopped after {frames} frames"),
            ExitReason::SurfaceGone => log::debug!("surface dropped; render loop ended after {frames} frames"),
            ExitReason::SetupFailed | ExitReason::ContextLost => {
                log::error!("render loop aborted ({reason:?}) after {frames} frames")
            }
        }
    }
}

impl<S: Surface> RenderLoop<S> {
    fn iterate(&mut self) -> ControlFlow<ExitReason> {
        let snapshot = self.worker.shared.snapshot();
        if !snapshot.running {
            return ControlFlow::Break(ExitReason::StopRequested);
        }

        // Resolved per iteration; the strong reference is dropped before the next one.
        let Some(surface) = self.worker.surface.upgrade() else {
            return ControlFlow::Break(ExitReason::SurfaceGone);
        };

        // Nothing can be presented to a zero-sized target (e.g. a minimized
        // window). Sleep until the viewport or the run flag changes.
        if !snapshot.viewport.is_drawable() && self.renderable.is_some() {
            drop(surface);
            self.worker.shared.wait_for_change(snapshot, IDLE_POLL);
            return ControlFlow::Continue(());
        }

        let _current = match CurrentContext::acquire(&*surface) {
            Ok(current) => current,
            Err(err) => {
                log::error!("failed to make graphics context current: {err}");
                return ControlFlow::Break(ExitReason::ContextLost);
            }
        };

        self.produce_frame(&surface, snapshot.viewport)
    }

    fn produce_frame(&mut self, surface: &S, viewport: ViewportSize) -> ControlFlow<ExitReason> {
        if self.renderable.is_none() {
            match self.initialize(surface) {
                Ok(r) => self.renderable = Some(r),
                Err(err) => {
                    log::error!("render setup failed: {err:#}");
                    return ControlFlow::Break(ExitReason::SetupFailed);
                }
            }
        }
        let Some(renderable) = self.renderable.as_mut() else {
            return ControlFlow::Break(ExitReason::SetupFailed);
        };

        let mut frame = match surface.begin_frame(viewport, self.worker.clear_color) {
            Ok(frame) => frame,
            Err(FrameError::Skipped) => {
                thread::yield_now();
                return ControlFlow::Continue(());
            }
            Err(FrameError::Fatal(err)) => {
                log::error!("failed to begin frame: {err:#}");
                return ControlFlow::Break(ExitReason::ContextLost);
            }
        };

        let time = self.clock.tick();
        let (view, projection) = self.worker.camera.matrices(viewport);

        renderable.update(time.dt_ms());
        renderable.render(&mut frame, &view, &projection);

        match surface.swap_buffers(frame) {
            Ok(()) => {
                self.worker.frames.fetch_add(1, Ordering::Relaxed);
                ControlFlow::Continue(())
            }
            Err(FrameError::Skipped) => ControlFlow::Continue(()),
            Err(FrameError::Fatal(err)) => {
                log::error!("failed to present frame: {err:#}");
                ControlFlow::Break(ExitReason::ContextLost)
            }
        }
    }

    /// One-time GPU initialization, run with the context current.
    fn initialize(&mut self, surface: &S) -> Result<Renderable<S>> {
        if let Some(loader) = self.worker.loader.take() {
            loader(surface).context("one-time GPU initialization failed")?;
        }

        let setup = self
            .worker
            .setup
            .take()
            .context("frame renderable was already constructed once")?;

        let renderable = setup(surface).context("failed to create frame renderable")?;
        log::debug!("frame renderable created");
        Ok(renderable)
    }
}
