//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue for a window
//! - creating & configuring the Surface (swapchain)
//! - tracking which thread may use the device for that surface
//! - acquiring, clearing and presenting frames on that thread

mod affinity;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use affinity::ContextAffinity;
pub use error::{ContextError, FrameError, SurfaceErrorAction};
pub use frame::GpuFrame;
pub use gpu::GpuSurface;
pub use init::GpuInit;
