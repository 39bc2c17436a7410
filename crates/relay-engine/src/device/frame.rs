/// A single acquired swapchain image plus the encoder recording into it.
///
/// Created by `GpuSurface::begin_frame` on the render thread and consumed by
/// `GpuSurface::swap_buffers`. Holding it prevents acquisition of further frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
