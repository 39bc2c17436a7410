//! GPU rendering subsystem.
//!
//! Renderables own their GPU resources (pipelines, buffers) and record into
//! the frame the render thread acquired for them.
//!
//! Convention:
//! - geometry is in world units, right-handed, +Y up
//! - the vertex shader applies a single `projection * view * model` uniform

mod ctx;
mod quad;

pub use ctx::{RenderCtx, RenderTarget};
pub use quad::QuadRenderer;
