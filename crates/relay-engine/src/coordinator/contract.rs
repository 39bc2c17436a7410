use std::thread::ThreadId;

use crate::coords::{ColorRgba, Mat4, ViewportSize};
use crate::device::{ContextError, FrameError};

/// A drawing surface whose graphics context may be used by one thread at a time.
///
/// The surface is created (and current) on the control thread. The render
/// coordinator releases it there, moves it to its worker, and from then on
/// only the worker calls the frame methods.
pub trait Surface: Send + Sync + 'static {
    /// Per-frame recording state handed to the renderable.
    type Frame: 'static;

    /// Binds the context to the calling thread.
    fn make_current(&self) -> Result<(), ContextError>;

    /// Unbinds the context from the calling thread.
    fn done_current(&self);

    fn is_context_valid(&self) -> bool;

    /// Rebinds the context's thread affinity. The context must not be current anywhere.
    fn move_context_to(&self, thread: ThreadId) -> Result<(), ContextError>;

    /// Applies `viewport` to the pipeline, acquires the next image and clears it.
    fn begin_frame(&self, viewport: ViewportSize, clear: ColorRgba) -> Result<Self::Frame, FrameError>;

    /// Submits and presents the frame (the buffer swap).
    fn swap_buffers(&self, frame: Self::Frame) -> Result<(), FrameError>;
}

/// The object that owns drawable GPU resources and produces one frame per call.
///
/// Constructed on the render thread after the first context acquisition and
/// never leaves it.
pub trait FrameRenderable<F> {
    /// Advances animation state by `elapsed_ms` milliseconds.
    fn update(&mut self, elapsed_ms: f32);

    /// Records draw commands into `frame`.
    fn render(&mut self, frame: &mut F, view: &Mat4, projection: &Mat4);
}

impl<F, R> FrameRenderable<F> for Box<R>
where
    R: FrameRenderable<F> + ?Sized,
{
    fn update(&mut self, elapsed_ms: f32) {
        (**self).update(elapsed_ms);
    }

    fn render(&mut self, frame: &mut F, view: &Mat4, projection: &Mat4) {
        (**self).render(frame, view, projection);
    }
}
