//! One-time transfer of the graphics context from the control thread to a
//! freshly spawned render thread.
//!
//! The render thread blocks on an acknowledgement before its first iteration,
//! so it cannot touch the context until the control thread has:
//! 1. released the context (`done_current`)
//! 2. checked that it is still valid
//! 3. rebound its thread affinity to the render thread

use std::sync::Weak;
use std::thread::ThreadId;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};

use super::Surface;

/// Message releasing (or cancelling) the render thread.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum HandoffAck {
    Proceed,
    Abort,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum HandoffOutcome {
    Transferred,
    /// The surface was dropped before the transfer; there was nothing to move.
    SurfaceGone,
}

pub(crate) fn channel() -> (Sender<HandoffAck>, Receiver<HandoffAck>) {
    crossbeam_channel::bounded(1)
}

/// Control-thread half of the hand-off.
pub(crate) fn transfer<S: Surface>(surface: &Weak<S>, worker: ThreadId) -> Result<HandoffOutcome> {
    let Some(surface) = surface.upgrade() else {
        return Ok(HandoffOutcome::SurfaceGone);
    };

    surface.done_current();

    anyhow::ensure!(
        surface.is_context_valid(),
        "graphics context is not valid; refusing to hand it to the render thread"
    );

    surface
        .move_context_to(worker)
        .context("failed to move graphics context to the render thread")?;

    log::debug!("graphics context handed off to {worker:?}");
    Ok(HandoffOutcome::Transferred)
}

/// Render-thread half: blocks until the control thread has finished `transfer`.
///
/// Returns `false` when the hand-off was aborted or the sender vanished.
pub(crate) fn await_transfer(ack: &Receiver<HandoffAck>) -> bool {
    matches!(ack.recv(), Ok(HandoffAck::Proceed))
}
