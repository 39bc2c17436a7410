use std::sync::{Arc, Mutex, PoisonError};
use std::thread::ThreadId;

use anyhow::{Context, Result};
use winit::window::Window;

use crate::coordinator::Surface;
use crate::coords::{ColorRgba, ViewportSize};

use super::surface;
use super::{ContextAffinity, ContextError, FrameError, GpuFrame, GpuInit};

/// A window's swapchain plus the wgpu device that renders into it.
///
/// Created on the control thread, where it starts out current. After the
/// context is handed to a render thread, only that thread may acquire and
/// present frames; see [`ContextAffinity`].
pub struct GpuSurface {
    /// Keeps the native window alive for the `'static` surface below.
    window: Arc<Window>,

    /// wgpu instance used to create the adapter and surface.
    #[allow(dead_code)]
    instance: wgpu::Instance,

    /// Surface bound to the window.
    surface: wgpu::Surface<'static>,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Active surface configuration. Only the render thread reconfigures it.
    config: Mutex<wgpu::SurfaceConfiguration>,

    /// Which thread may currently use the device for this surface.
    affinity: ContextAffinity,
}

impl GpuSurface {
    /// Creates the device and swapchain for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; callers on the
    /// control thread block on it with `pollster`.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("relay device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, prefer_srgb)
            .context("no supported surface formats")?;

        let alpha_mode = surface::choose_alpha_mode(&surface_caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        log::info!(
            "gpu surface ready: {}x{} {:?} {:?}",
            size.width,
            size.height,
            format,
            present_mode,
        );

        Ok(Self {
            window,
            instance,
            surface,
            adapter,
            device,
            queue,
            config: Mutex::new(config),
            affinity: ContextAffinity::new(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .format
    }

    /// Marks the context unusable, e.g. right before the window is destroyed.
    pub fn invalidate(&self) {
        self.affinity.invalidate();
    }
}

impl Surface for GpuSurface {
    type Frame = GpuFrame;

    fn make_current(&self) -> Result<(), ContextError> {
        self.affinity.make_current()
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

    fn begin_frame(&self, viewport: ViewportSize, clear: ColorRgba) -> Result<GpuFrame, FrameError> {
        self.affinity.check_current().map_err(FrameError::fatal)?;

        let surface_texture = {
            let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
            if !surface::apply_viewport(&self.surface, &self.device, &mut config, viewport) {
                return Err(FrameError::Skipped);
            }

            match self.surface.get_current_texture() {
                Ok(texture) => texture,
                Err(err) => {
                    log::warn!("failed to acquire swapchain image: {err}");
                    return Err(
                        surface::map_surface_error(&self.surface, &self.device, &config, err).into(),
                    );
                }
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("relay frame encoder"),
            });

        // Clear pass; dropped before the encoder is handed to the renderable.
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("relay clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    fn swap_buffers(&self, frame: GpuFrame) -> Result<(), FrameError> {
        self.affinity.check_current().map_err(FrameError::fatal)?;

        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);

        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}
