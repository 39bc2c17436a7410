use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coordinator::FrameRenderable;
use crate::coords::Mat4;
use crate::device::GpuFrame;

use super::{RenderCtx, RenderTarget};

/// Yaw rate about +Y, in degrees per millisecond (100°/s).
const DEGREES_PER_MS: f32 = 0.1;

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Corners counter-clockwise from bottom-left: red, green, blue, yellow.
fn quad_vertices(width: f32, height: f32) -> [QuadVertex; 4] {
    let w = width * 0.5;
    let h = height * 0.5;
    [
        QuadVertex { position: [-w, -h, 0.0], color: [1.0, 0.0, 0.0] },
        QuadVertex { position: [ w, -h, 0.0], color: [0.0, 1.0, 0.0] },
        QuadVertex { position: [ w,  h, 0.0], color: [0.0, 0.0, 1.0] },
        QuadVertex { position: [-w,  h, 0.0], color: [1.0, 1.0, 0.0] },
    ]
}

/// Advances `yaw` (degrees) by `elapsed_ms`, wrapped into `[0, 360)`.
fn spin(yaw: f32, elapsed_ms: f32) -> f32 {
    (yaw + DEGREES_PER_MS * elapsed_ms).rem_euclid(360.0)
}

fn camera_matrix(yaw_degrees: f32, view: &Mat4, projection: &Mat4) -> Mat4 {
    *projection * *view * Mat4::rotation_y(yaw_degrees.to_radians())
}

/// A vertex-coloured quad spinning about the +Y axis.
///
/// Created on the render thread (it needs the context current) and owns its
/// own queue handle from then on.
pub struct QuadRenderer {
    queue: wgpu::Queue,

    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    camera_ubo: wgpu::Buffer,

    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,

    yaw_degrees: f32,
}

impl QuadRenderer {
    /// Builds a `width` x `height` quad centred on the origin.
    pub fn new(ctx: &RenderCtx<'_>, width: f32, height: f32) -> Result<Self> {
        anyhow::ensure!(
            width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0,
            "quad size must be positive, got {width}x{height}"
        );

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("relay quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let ubo_size = std::num::NonZeroU64::new(std::mem::size_of::<Mat4>() as u64)
            .context("camera uniform has zero size")?;

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("relay quad bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(ubo_size),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("relay quad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("relay quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Both faces are visible while spinning.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let camera_ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("relay quad camera ubo"),
            contents: bytemuck::bytes_of(&Mat4::IDENTITY),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("relay quad bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        let vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("relay quad vbo"),
            contents: bytemuck::cast_slice(&quad_vertices(width, height)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("relay quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!("quad renderer created ({width}x{height}, {:?})", ctx.surface_format);

        Ok(Self {
            queue: ctx.queue.clone(),
            pipeline,
            bind_group,
            camera_ubo,
            vbo,
            ibo,
            yaw_degrees: 0.0,
        })
    }

    fn draw(&self, target: &mut RenderTarget<'_>, camera: &Mat4) {
        self.queue
            .write_buffer(&self.camera_ubo, 0, bytemuck::bytes_of(camera));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("relay quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
        rpass.set_index_buffer(self.ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}

impl FrameRenderable<GpuFrame> for QuadRenderer {
    fn update(&mut self, elapsed_ms: f32) {
        self.yaw_degrees = spin(self.yaw_degrees, elapsed_ms);
    }

    fn render(&mut self, frame: &mut GpuFrame, view: &Mat4, projection: &Mat4) {
        let camera = camera_matrix(self.yaw_degrees, view, projection);
        self.draw(&mut RenderTarget::from_frame(frame), &camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Camera;
    use crate::coords::{Vec3, ViewportSize};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn vertices_span_the_requested_size_with_corner_colors() {
        let v = quad_vertices(2.0, 1.0);
        assert_eq!(v[0].position, [-1.0, -0.5, 0.0]);
        assert_eq!(v[2].position, [1.0, 0.5, 0.0]);
        assert_eq!(v[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(v[1].color, [0.0, 1.0, 0.0]);
        assert_eq!(v[2].color, [0.0, 0.0, 1.0]);
        assert_eq!(v[3].color, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn indices_form_two_triangles_sharing_the_diagonal() {
        assert_eq!(QUAD_INDICES, [0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn spins_one_hundred_degrees_per_second() {
        assert!(approx(spin(0.0, 1000.0), 100.0));
        assert!(approx(spin(0.0, 16.0), 1.6));
        assert_eq!(spin(42.0, 0.0), 42.0);
    }

    #[test]
    fn yaw_wraps_at_a_full_turn() {
        assert!(approx(spin(350.0, 200.0), 10.0));
    }

    #[test]
    fn camera_matrix_keeps_the_quad_centre_on_screen_centre() {
        let camera = Camera::default();
        let (view, projection) = camera.matrices(ViewportSize::new(720, 576));

        for yaw in [0.0, 45.0, 90.0, 270.0] {
            let clip = camera_matrix(yaw, &view, &projection).transform_point(Vec3::new(0.0, 0.0, 0.0));
            assert!(clip[3] > 0.0);
            assert!(approx(clip[0] / clip[3], 0.0));
            assert!(approx(clip[1] / clip[3], 0.0));
        }
    }

    #[test]
    fn quarter_turn_collapses_the_quad_to_its_axis() {
        let camera = Camera::default();
        let (view, projection) = camera.matrices(ViewportSize::new(720, 576));
        let m = camera_matrix(90.0, &view, &projection);

        let clip = m.transform_point(Vec3::new(0.5, 0.0, 0.0));
        assert!(approx(clip[0] / clip[3], 0.0));
    }
}
