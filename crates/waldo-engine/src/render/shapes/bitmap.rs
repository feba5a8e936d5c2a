use std::collections::HashMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::{Bitmap, RenderCtx};
use crate::scene::{DrawCmd, DrawList};

use super::common::{
    create_pipeline, uniform_layout_entry, QuadVertex, ViewportUniform, QUAD_INDICES,
    QUAD_VERTICES,
};

/// Renderer for `DrawCmd::Bitmap`.
///
/// Each distinct bitmap revision is uploaded once and kept until a prepare
/// pass no longer references it. Bitmaps are drawn at native size with
/// nearest sampling so captured frames reproduce pixel-for-pixel.
#[derive(Default)]
pub struct BitmapRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    sampler: Option<wgpu::Sampler>,
    viewport_ubo: Option<wgpu::Buffer>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    /// Uploaded textures keyed by `Bitmap::revision`.
    textures: HashMap<u64, UploadedBitmap>,

    /// Per-instance placement plus the revision to bind, in paint order.
    instance_vbo: Option<wgpu::Buffer>,
    prepared: Vec<u64>,
}

struct UploadedBitmap {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl BitmapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads placement data (and any new bitmap textures) in paint order.
    ///
    /// Returns the number of prepared instances.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>, draw_list: &mut DrawList) -> u32 {
        let bitmaps: Vec<(BitmapInstance, std::rc::Rc<Bitmap>)> = draw_list
            .iter_in_paint_order()
            .filter_map(|item| match &item.cmd {
                DrawCmd::Bitmap(cmd) => Some((
                    BitmapInstance {
                        origin: [cmd.origin.x, cmd.origin.y],
                        size: [cmd.bitmap.width() as f32, cmd.bitmap.height() as f32],
                    },
                    cmd.bitmap.clone(),
                )),
                _ => None,
            })
            .collect();

        self.prepared.clear();
        if bitmaps.is_empty() {
            self.evict_unused();
            return 0;
        }

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);

        for (_, bitmap) in &bitmaps {
            self.ensure_uploaded(ctx, bitmap);
            self.prepared.push(bitmap.revision());
        }
        self.evict_unused();

        if let Some(ubo) = self.viewport_ubo.as_ref() {
            ctx.queue
                .write_buffer(ubo, 0, bytemuck::bytes_of(&ViewportUniform::new(ctx.viewport)));
        }

        // Few bitmaps per frame; recreate the instance buffer at exact size.
        let instances: Vec<BitmapInstance> = bitmaps.iter().map(|(inst, _)| *inst).collect();
        self.instance_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waldo bitmap instance vbo"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.prepared.len() as u32
    }

    /// Draws the prepared instances in `range`, one texture bind per instance.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, range: Range<u32>) {
        let (Some(pipeline), Some(quad_vbo), Some(quad_ibo), Some(instance_vbo)) = (
            self.pipeline.as_ref(),
            self.quad_vbo.as_ref(),
            self.quad_ibo.as_ref(),
            self.instance_vbo.as_ref(),
        ) else {
            return;
        };

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for i in range {
            let Some(revision) = self.prepared.get(i as usize) else { break };
            let Some(uploaded) = self.textures.get(revision) else { continue };
            rpass.set_bind_group(0, &uploaded.bind_group, &[]);
            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, i..i + 1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_uploaded(&mut self, ctx: &RenderCtx<'_>, bitmap: &Bitmap) {
        if self.textures.contains_key(&bitmap.revision()) {
            return;
        }
        let (Some(bgl), Some(sampler), Some(ubo)) = (
            self.bind_group_layout.as_ref(),
            self.sampler.as_ref(),
            self.viewport_ubo.as_ref(),
        ) else {
            return;
        };

        let size = wgpu::Extent3d {
            width: bitmap.width(),
            height: bitmap.height(),
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("waldo bitmap texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bitmap.pixels().as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * bitmap.width()),
                rows_per_image: Some(bitmap.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("waldo bitmap bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::trace!("uploaded bitmap revision {} ({}x{})", bitmap.revision(), bitmap.width(), bitmap.height());
        self.textures
            .insert(bitmap.revision(), UploadedBitmap { texture, bind_group });
    }

    fn evict_unused(&mut self) {
        let prepared = &self.prepared;
        self.textures.retain(|revision, uploaded| {
            let keep = prepared.contains(revision);
            if !keep {
                uploaded.texture.destroy();
            }
            keep
        });
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("waldo bitmap shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bitmap.wgsl").into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("waldo bitmap bgl"),
            entries: &[
                uniform_layout_entry::<ViewportUniform>(0, wgpu::ShaderStages::VERTEX),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = create_pipeline(
            ctx.device,
            "waldo bitmap pipeline",
            &shader,
            &bgl,
            &[QuadVertex::layout(), BitmapInstance::layout()],
            ctx.surface_format,
        );

        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("waldo bitmap sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
        self.viewport_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("waldo bitmap viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);

        // Bind groups reference the old layout and uniform buffer.
        for (_, uploaded) in self.textures.drain() {
            uploaded.texture.destroy();
        }
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waldo bitmap quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waldo bitmap quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Instance data layout (16 bytes):
///
///  offset  0  origin  [f32; 2]   loc 1  (top-left, window pixels)
///  offset  8  size    [f32; 2]   loc 2
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct BitmapInstance {
    origin: [f32; 2],
    size: [f32; 2],
}

impl BitmapInstance {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2  // size
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BitmapInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}
