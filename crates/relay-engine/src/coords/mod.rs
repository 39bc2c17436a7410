//! Geometry types shared by the coordinator, the device layer and renderables.
//!
//! Conventions:
//! - viewport sizes are physical pixels
//! - matrices are column-major, right-handed, with wgpu's `[0, 1]` clip depth

mod color;
mod mat4;
mod viewport;

pub use color::ColorRgba;
pub use mat4::{Mat4, Vec3};
pub use viewport::ViewportSize;
