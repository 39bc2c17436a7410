//! In-memory surface used by the coordinator tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use crate::coords::{ColorRgba, Mat4, ViewportSize};
use crate::device::{ContextAffinity, ContextError, FrameError};

use super::{FrameRenderable, Surface};

/// Call record shared between a test, its mock surface and its renderable.
///
/// Outlives the surface so tests can inspect it after the surface is dropped.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    pub make_current: AtomicU64,
    pub begin_frame: AtomicU64,
    pub swaps: AtomicU64,
    pub loads: AtomicU64,
    pub setups: AtomicU64,
    pub updates: AtomicU64,
    pub setup_saw_current: AtomicBool,
    /// Viewports seen by `begin_frame`, consecutive duplicates collapsed.
    pub viewports: Mutex<Vec<ViewportSize>>,
    /// Threads that successfully made the context current.
    pub threads: Mutex<HashSet<ThreadId>>,
    pub first_elapsed: Mutex<Option<f32>>,
    /// Aspect ratio read back from the last projection passed to `render`.
    pub last_aspect: Mutex<Option<f32>>,
    /// Set when a projection's aspect did not match the frame's viewport.
    pub aspect_mismatch: AtomicBool,
}

impl CallLog {
    pub fn make_current_calls(&self) -> u64 {
        self.make_current.load(Ordering::SeqCst)
    }

    pub fn swap_calls(&self) -> u64 {
        self.swaps.load(Ordering::SeqCst)
    }

    pub fn viewports(&self) -> Vec<ViewportSize> {
        self.viewports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_viewport(&self) -> Option<ViewportSize> {
        self.viewports().last().copied()
    }

    pub fn threads(&self) -> HashSet<ThreadId> {
        self.threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_viewport(&self, viewport: ViewportSize) {
        let mut seen = self.viewports.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.last() != Some(&viewport) {
            seen.push(viewport);
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockFrame {
    pub viewport: ViewportSize,
}

/// Surface that records every call and enforces context affinity for real.
#[derive(Debug)]
pub(crate) struct MockSurface {
    pub log: Arc<CallLog>,
    affinity: ContextAffinity,
    /// Number of upcoming `begin_frame` calls to report as skipped.
    skip_next: AtomicU32,
    fail_next_begin: AtomicBool,
}

impl MockSurface {
    /// Creates a surface current on the calling thread, like a freshly created window context.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(CallLog::default()),
            affinity: ContextAffinity::new(),
            skip_next: AtomicU32::new(0),
            fail_next_begin: AtomicBool::new(false),
        })
    }

    pub fn invalidate(&self) {
        self.affinity.invalidate();
    }

    pub fn skip_frames(&self, n: u32) {
        self.skip_next.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_frame(&self) {
        self.fail_next_begin.store(true, Ordering::SeqCst);
    }

    pub fn is_current_here(&self) -> bool {
        self.affinity.check_current().is_ok()
    }
}

impl Surface for MockSurface {
    type Frame = MockFrame;

    fn make_current(&self) -> Result<(), ContextError> {
        self.log.make_current.fetch_add(1, Ordering::SeqCst);
        self.affinity.make_current()?;
        self.log
            .threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(thread::current().id());
        Ok(())
    }

    fn done_current(&self) {
        self.affinity.done_current();
    }

    fn is_context_valid(&self) -> bool {
        self.affinity.is_valid()
    }

    fn move_context_to(&self, thread: ThreadId) -> Result<(), ContextError> {
        self.affinity.move_to(thread)
    }

    fn begin_frame(&self, viewport: ViewportSize, _clear: ColorRgba) -> Result<MockFrame, FrameError> {
        self.affinity.check_current().map_err(FrameError::fatal)?;
        self.log.begin_frame.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_begin.swap(false, Ordering::SeqCst) {
            return Err(FrameError::fatal(anyhow::anyhow!("device lost")));
        }
        let skipped = self
            .skip_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if skipped {
            return Err(FrameError::Skipped);
        }

        self.log.record_viewport(viewport);
        Ok(MockFrame { viewport })
    }

    fn swap_buffers(&self, _frame: MockFrame) -> Result<(), FrameError> {
        self.affinity.check_current().map_err(FrameError::fatal)?;
        self.log.swaps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Renderable that only records what it was asked to do.
pub(crate) struct RecordingRenderable {
    log: Arc<CallLog>,
}

impl RecordingRenderable {
    /// Builds the renderable the way a real setup step would: on the render
    /// thread, with the context current.
    pub fn setup(surface: &MockSurface) -> anyhow::Result<Self> {
        let log = Arc::clone(&surface.log);
        log.setups.fetch_add(1, Ordering::SeqCst);
        log.setup_saw_current
            .store(surface.is_current_here(), Ordering::SeqCst);
        Ok(Self { log })
    }
}

impl FrameRenderable<MockFrame> for RecordingRenderable {
    fn update(&mut self, elapsed_ms: f32) {
        self.log.updates.fetch_add(1, Ordering::SeqCst);
        self.log
            .first_elapsed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(elapsed_ms);
    }

    fn render(&mut self, frame: &mut MockFrame, _view: &Mat4, projection: &Mat4) {
        let aspect = projection.cols[1][1] / projection.cols[0][0];
        if (aspect - frame.viewport.aspect_ratio()).abs() > 1e-4 {
            self.log.aspect_mismatch.store(true, Ordering::SeqCst);
        }
        *self
            .log
            .last_aspect
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(aspect);
    }
}
