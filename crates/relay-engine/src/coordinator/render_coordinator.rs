use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

use crate::coords::ViewportSize;

use super::handoff::{self, HandoffAck, HandoffOutcome};
use super::shared::SharedState;
use super::worker::{Renderable, Worker};
use super::{CoordinatorConfig, FrameRenderable, Surface};

/// Observable lifecycle of a [`RenderCoordinator`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CoordinatorState {
    /// Constructed, not started.
    Idle,
    /// The render thread is alive.
    Running,
    /// The render loop has exited. Terminal.
    Stopped,
}

enum Phase<S: Surface> {
    Idle(Worker<S>),
    Running(JoinHandle<()>),
    Stopped,
}

/// Drives a continuous render loop for one surface on a dedicated thread.
///
/// The coordinator holds only a weak reference to the surface: whoever owns
/// the surface may drop it at any time and the loop ends on its next
/// iteration. The graphics context is moved to the render thread by
/// [`start`](Self::start) and is used exclusively there until the thread exits.
///
/// A coordinator runs at most once. After [`stop`](Self::stop), or after the
/// loop ends on its own, construct a new one.
pub struct RenderCoordinator<S: Surface> {
    surface: Weak<S>,
    shared: Arc<SharedState>,
    frames: Arc<AtomicU64>,
    phase: Phase<S>,
}

impl<S: Surface> RenderCoordinator<S> {
    /// Creates an idle coordinator for `surface`.
    ///
    /// `setup` runs once on the render thread, with the context current, to
    /// create the frame renderable. No context access happens here.
    pub fn new<R, F>(surface: &Arc<S>, config: CoordinatorConfig, setup: F) -> Self
    where
        F: FnOnce(&S) -> Result<R> + Send + 'static,
        R: FrameRenderable<S::Frame> + 'static,
    {
        let surface = Arc::downgrade(surface);
        let shared = Arc::new(SharedState::new(config.initial_viewport));
        let frames = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            surface: surface.clone(),
            shared: Arc::clone(&shared),
            frames: Arc::clone(&frames),
            loader: None,
            setup: Some(Box::new(move |s: &S| {
                setup(s).map(|r| Box::new(r) as Renderable<S>)
            })),
            camera: config.camera,
            clear_color: config.clear_color,
        };

        Self {
            surface,
            shared,
            frames,
            phase: Phase::Idle(worker),
        }
    }

    /// Injects a one-time initialization step run before the renderable is created.
    ///
    /// This is where platform-specific entry-point loading belongs. A failure is
    /// fatal to the coordinator. Has no effect once the coordinator has started.
    pub fn with_loader<L>(mut self, loader: L) -> Self
    where
        L: FnOnce(&S) -> Result<()> + Send + 'static,
    {
        if let Phase::Idle(worker) = &mut self.phase {
            worker.loader = Some(Box::new(loader));
        }
        self
    }

    /// Updates the viewport used from the next frame on. Callable from any thread.
    pub fn set_viewport_size(&self, width: u32, height: u32) {
        self.shared.set_viewport(ViewportSize::new(width, height));
    }

    /// Returns the viewport the next frame will use.
    pub fn viewport(&self) -> ViewportSize {
        self.shared.snapshot().viewport
    }

    pub fn state(&self) -> CoordinatorState {
        match &self.phase {
            Phase::Idle(_) => CoordinatorState::Idle,
            Phase::Running(handle) if !handle.is_finished() => CoordinatorState::Running,
            Phase::Running(_) | Phase::Stopped => CoordinatorState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == CoordinatorState::Running
    }

    /// Number of frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Spawns the render thread and hands the graphics context to it.
    ///
    /// Does nothing if the thread is already running. The render thread does
    /// not touch the context until the hand-off has completed. If the hand-off
    /// fails the thread is joined and the error returned; the coordinator is
    /// then stopped.
    pub fn start(&mut self) -> Result<()> {
        let worker = match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Idle(worker) => worker,
            Phase::Running(handle) => {
                let finished = handle.is_finished();
                self.phase = Phase::Running(handle);
                if finished {
                    anyhow::bail!("render loop has already exited; create a new coordinator");
                }
                log::debug!("render thread already running");
                return Ok(());
            }
            Phase::Stopped => anyhow::bail!("render coordinator was stopped; create a new one"),
        };

        let (ack_tx, ack_rx) = handoff::channel();

        let handle = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || worker.run(ack_rx))
            .context("failed to spawn render thread")?;

        match handoff::transfer(&self.surface, handle.thread().id()) {
            Ok(outcome) => {
                if outcome == HandoffOutcome::SurfaceGone {
                    log::debug!("surface already dropped at start; render loop will exit immediately");
                }
                // The receiver lives until the worker reads it; a send failure
                // means the thread died, which `stop` will observe on join.
                let _ = ack_tx.send(HandoffAck::Proceed);
                self.phase = Phase::Running(handle);
                log::info!("render thread started");
                Ok(())
            }
            Err(err) => {
                let _ = ack_tx.send(HandoffAck::Abort);
                join_render_thread(handle);
                Err(err)
            }
        }
    }

    /// Clears the run flag and blocks until the render thread has exited.
    ///
    /// Safe to call repeatedly and before `start`. Either way the coordinator
    /// ends up stopped.
    pub fn stop(&mut self) {
        self.shared.request_stop();

        match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Running(handle) => {
                join_render_thread(handle);
                log::info!("render thread joined");
            }
            Phase::Idle(_) => log::debug!("render coordinator stopped before it was started"),
            Phase::Stopped => {}
        }
    }
}

impl<S: Surface> Drop for RenderCoordinator<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join_render_thread(handle: JoinHandle<()>) {
    if let Err(e) = handle.join() {
        log::error!("render thread panicked: {e:?}");
    }
}
