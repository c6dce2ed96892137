//! wgpu implementation of [`BatchBackend`].

use std::cell::Cell;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::backend::{BatchBackend, BatchDraw, BatchUniforms};
use super::slots::MAX_TEXTURE_SLOTS;
use super::vertex::VERTICES_PER_SHAPE;
use super::{RenderCtx, RenderTarget, ShapeFamily, Vertex};
use crate::coords::Viewport;
use crate::paint::Color;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct UniformBlock {
    world_projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    screen: [f32; 2],
    time: f32,
    _pad: f32,
    texture_slots: [[i32; 4]; MAX_TEXTURE_SLOTS / 4],
}

impl From<&BatchUniforms> for UniformBlock {
    fn from(u: &BatchUniforms) -> Self {
        let mut texture_slots = [[0i32; 4]; MAX_TEXTURE_SLOTS / 4];
        for (i, slot) in u.texture_slots.iter().enumerate() {
            texture_slots[i / 4][i % 4] = *slot;
        }
        Self {
            world_projection: u.world_projection.to_cols_array_2d(),
            view: u.view.to_cols_array_2d(),
            screen: u.screen_size.to_array(),
            time: u.time,
            _pad: 0.0,
            texture_slots,
        }
    }
}

fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Long-lived GPU state shared by every batch: shader, one pipeline per
/// shape family, layouts, samplers and a white fallback texture for unused
/// slots.
pub struct BatchPipelines {
    format: wgpu::TextureFormat,
    shapes: wgpu::RenderPipeline,
    glyphs: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
    fallback: wgpu::TextureView,
    max_texture_slots: usize,
    warned_detached: Cell<bool>,
}

impl BatchPipelines {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let max_texture_slots = (device.limits().max_sampled_textures_per_shader_stage as usize)
            .min(MAX_TEXTURE_SLOTS);
        log::info!("texture slots available per draw: {max_texture_slots}");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("nabu batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nabu batch uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<UniformBlock>() as u64),
                },
                count: None,
            }],
        });

        let mut texture_entries = Vec::with_capacity(MAX_TEXTURE_SLOTS + 1);
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        for slot in 1..=MAX_TEXTURE_SLOTS as u32 {
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nabu batch textures bgl"),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("nabu batch pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = |label: &str, fragment_entry: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[Vertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };
        let shapes = pipeline("nabu shapes pipeline", "fs_shapes");
        let glyphs = pipeline("nabu glyphs pipeline", "fs_glyphs");

        let sampler = |label: &str, filter: wgpu::FilterMode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        };
        let nearest = sampler("nabu nearest sampler", wgpu::FilterMode::Nearest);
        let linear = sampler("nabu linear sampler", wgpu::FilterMode::Linear);

        let fallback = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("nabu fallback texture"),
                size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let fallback = fallback.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            format,
            shapes,
            glyphs,
            uniform_layout,
            texture_layout,
            nearest,
            linear,
            fallback,
            max_texture_slots,
            warned_detached: Cell::new(false),
        }
    }

    /// Surface format the pipelines were built for.
    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Textures the device can sample in one draw, capped at the shader's
    /// slot count.
    #[inline]
    pub fn max_texture_slots(&self) -> usize {
        self.max_texture_slots
    }

    fn pipeline(&self, family: ShapeFamily) -> &wgpu::RenderPipeline {
        match family {
            ShapeFamily::Shapes => &self.shapes,
            ShapeFamily::Glyphs => &self.glyphs,
        }
    }

    fn sampler(&self, family: ShapeFamily) -> &wgpu::Sampler {
        match family {
            ShapeFamily::Shapes => &self.nearest,
            ShapeFamily::Glyphs => &self.linear,
        }
    }
}

/// GPU objects owned by one batch.
pub struct WgpuBatchBuffers {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    ubo: wgpu::Buffer,
    uniforms: wgpu::BindGroup,
}

/// Per-flush backend recording into the frame's encoder.
///
/// Validation errors raised while it lives are captured in an error scope
/// and returned by [`finish`](BatchBackend::finish).
pub struct WgpuBackend<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: &'a mut wgpu::CommandEncoder,
    color_view: &'a wgpu::TextureView,
    pipelines: &'a BatchPipelines,
    scope: Option<wgpu::ErrorScopeGuard>,
}

impl<'a> WgpuBackend<'a> {
    pub fn new(
        ctx: &RenderCtx<'a>,
        target: &'a mut RenderTarget<'_>,
        pipelines: &'a BatchPipelines,
    ) -> Self {
        if pipelines.format != ctx.surface_format {
            log::warn!(
                "batch pipelines built for {:?}, surface is {:?}",
                pipelines.format,
                ctx.surface_format
            );
        }
        let scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        Self {
            device: ctx.device,
            queue: ctx.queue,
            encoder: &mut *target.encoder,
            color_view: target.color_view,
            pipelines,
            scope: Some(scope),
        }
    }

    fn begin_pass(&mut self, label: &str, load: wgpu::LoadOp<wgpu::Color>) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn texture_bind_group(&self, draw: &BatchDraw<'_>) -> wgpu::BindGroup {
        let pipelines = self.pipelines;
        let mut views = [&pipelines.fallback; MAX_TEXTURE_SLOTS];
        for (slot, texture) in draw.textures.iter().enumerate().take(MAX_TEXTURE_SLOTS) {
            match texture.gpu() {
                Some(gpu) => views[slot] = &gpu.view,
                None => {
                    if !pipelines.warned_detached.replace(true) {
                        log::warn!("texture '{}' has no GPU storage; drawing white", texture.label());
                    }
                }
            }
        }

        let mut entries = Vec::with_capacity(MAX_TEXTURE_SLOTS + 1);
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(pipelines.sampler(draw.family)),
        });
        for (i, view) in views.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu batch textures"),
            layout: &pipelines.texture_layout,
            entries: &entries,
        })
    }
}

impl BatchBackend for WgpuBackend<'_> {
    type Buffers = WgpuBatchBuffers;

    fn clear(&mut self, color: Color, _viewport: Viewport) {
        let _pass = self.begin_pass("nabu clear pass", wgpu::LoadOp::Clear(color.into()));
    }

    fn create_buffers(
        &mut self,
        family: ShapeFamily,
        max_shapes: usize,
        indices: &[u32],
    ) -> WgpuBatchBuffers {
        let vbo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(match family {
                ShapeFamily::Shapes => "nabu shapes vbo",
                ShapeFamily::Glyphs => "nabu glyphs vbo",
            }),
            size: (max_shapes * VERTICES_PER_SHAPE * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nabu batch ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nabu batch ubo"),
            size: std::mem::size_of::<UniformBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu batch uniforms"),
            layout: &self.pipelines.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        WgpuBatchBuffers { vbo, ibo, ubo, uniforms }
    }

    fn draw(&mut self, buffers: &mut WgpuBatchBuffers, draw: &BatchDraw<'_>) -> bool {
        if draw.vertices.is_empty() || !draw.viewport.is_valid() {
            return false;
        }

        let block = UniformBlock::from(&draw.uniforms);
        self.queue.write_buffer(&buffers.ubo, 0, bytemuck::bytes_of(&block));
        self.queue.write_buffer(&buffers.vbo, 0, bytemuck::cast_slice(draw.vertices));

        let textures = self.texture_bind_group(draw);
        let pipelines = self.pipelines;
        let pipeline = pipelines.pipeline(draw.family);
        let vertex_bytes = std::mem::size_of_val(draw.vertices) as u64;
        let vp = draw.viewport;

        let mut rpass = self.begin_pass("nabu batch pass", wgpu::LoadOp::Load);
        rpass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &buffers.uniforms, &[]);
        rpass.set_bind_group(1, &textures, &[]);
        rpass.set_vertex_buffer(0, buffers.vbo.slice(..vertex_bytes));
        rpass.set_index_buffer(buffers.ibo.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..draw.index_count, 0, 0..1);
        true
    }

    fn finish(&mut self) -> Option<String> {
        let scope = self.scope.take()?;
        pollster::block_on(scope.pop()).map(|err| err.to_string())
    }
}

impl Drop for WgpuBackend<'_> {
    fn drop(&mut self) {
        if let Some(err) = self.finish() {
            log::error!("GPU error after flush: {err}");
        }
    }
}
