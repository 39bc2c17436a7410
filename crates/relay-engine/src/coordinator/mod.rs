//! Cross-thread render coordination.
//!
//! A [`RenderCoordinator`] runs a continuous render loop on a dedicated
//! thread while the control thread keeps ownership of the surface and
//! forwards resize and close notifications. Rules:
//! - the graphics context is handed to the render thread exactly once per start
//! - the render thread only ever holds a weak reference to the surface
//! - run flag and viewport are read and written together under one lock
//! - the frame renderable is created on the render thread and never leaves it

mod camera;
mod config;
mod contract;
mod handoff;
mod owner;
mod render_coordinator;
mod shared;
mod worker;

#[cfg(test)]
pub(crate) mod mock;

pub use camera::Camera;
pub use config::CoordinatorConfig;
pub use contract::{FrameRenderable, Surface};
pub use owner::SurfaceOwner;
pub use render_coordinator::{CoordinatorState, RenderCoordinator};
