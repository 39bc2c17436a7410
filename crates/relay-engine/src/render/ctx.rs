use crate::device::{GpuFrame, GpuSurface};

/// Renderer-facing context (device/queue + surface format).
///
/// Only valid on the thread the surface's context is current on.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
        }
    }

    pub fn from_surface(surface: &'a GpuSurface) -> Self {
        Self::new(surface.device(), surface.queue(), surface.surface_format())
    }
}

/// Target for drawing (encoder + color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }

    pub fn from_frame(frame: &'a mut GpuFrame) -> Self {
        Self::new(&mut frame.encoder, &frame.view)
    }
}
