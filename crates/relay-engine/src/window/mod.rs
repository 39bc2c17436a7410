//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and acts as the surface owner for
//! the render coordinator.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
