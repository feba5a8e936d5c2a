use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3};
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::coords::{AffineTransform, CoordinateTransformer, ImageSize, WindowSize};

use super::RenderTarget;

/// Renders one image as a full-viewport textured quad.
///
/// The texture keeps the image's native resolution; window resizes only
/// change the coordinate mapping. Release GPU memory with
/// [`destroy`](Self::destroy).
pub struct RenderSurface {
    queue: wgpu::Queue,

    texture: Option<wgpu::Texture>,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    model_ubo: wgpu::Buffer,
    quad_vbo: wgpu::Buffer,

    transformer: CoordinateTransformer,
}

impl RenderSurface {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        window_size: WindowSize,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let image_size = ImageSize::new(image.width(), image.height())
            .ok_or_else(|| anyhow::anyhow!("image has no pixels"))?;

        let max = device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            image_size.width() <= max && image_size.height() <= max,
            "image {image_size} exceeds the device texture limit of {max}px"
        );

        let extent = wgpu::Extent3d {
            width: image_size.width(),
            height: image_size.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("waldo image texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image_size.width()),
                rows_per_image: Some(image_size.height()),
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("waldo image sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let model_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waldo image model ubo"),
            contents: bytemuck::bytes_of(&ModelUniform::new(AffineTransform::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waldo image quad vbo"),
            contents: bytemuck::cast_slice(&quad_vertices(-1.0, -1.0, 2.0, 2.0)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("waldo image bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<ModelUniform>() as u64,
                        ),
                    },
                    count: None,
                },
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("waldo image bind group"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: model_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("waldo image shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/image_quad.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("waldo image pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("waldo image pipeline"),
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
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
        });

        log::info!("image {image_size} uploaded, window {window_size}");

        Ok(Self {
            queue: queue.clone(),
            texture: Some(texture),
            pipeline,
            bind_group,
            model_ubo,
            quad_vbo,
            transformer: CoordinateTransformer::new(window_size, image_size),
        })
    }

    #[inline]
    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    /// Tracks a new window size. The texture keeps its native size.
    pub fn resize(&mut self, size: WindowSize) {
        self.transformer.set_window_size(size);
    }

    pub fn set_model_transform(&mut self, model: AffineTransform) {
        self.transformer.set_model_transform(model);
    }

    /// Clears `target` to transparent black and draws the image quad.
    pub fn render(&self, target: &mut RenderTarget<'_>) {
        self.queue.write_buffer(
            &self.model_ubo,
            0,
            bytemuck::bytes_of(&ModelUniform::new(self.transformer.model_transform())),
        );

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("waldo image pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
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
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
    }

    /// Releases the image texture.
    pub fn destroy(mut self) {
        if let Some(texture) = self.texture.take() {
            texture.destroy();
            log::debug!("image texture released");
        }
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        if self.texture.is_some() {
            log::error!("render surface dropped without destroy()");
        }
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ModelUniform {
    model: [f32; 16],
}

impl ModelUniform {
    /// Model transform followed by a clip-space Y mirror.
    ///
    /// The mirror puts normalized `+Y` on the last row of the offscreen
    /// texture, so the frame lands bottom-up like a GL framebuffer and the
    /// readback row flip restores the window's top-down order.
    fn new(model: AffineTransform) -> Self {
        let mirror_y = DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0));
        let clip = AffineTransform::from_matrix(mirror_y * model.matrix());
        Self {
            model: clip.to_cols_array_f32(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct QuadVertex {
    xy: [f32; 2],
    uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // xy
        1 => Float32x2  // uv
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTEX_COUNT: u32 = 6;

/// Two triangles covering `(x, y)..(x + w, y + h)` in NDC.
///
/// UVs have a top-left origin: texel row 0 maps to the upper (`+Y`) edge.
fn quad_vertices(x: f32, y: f32, w: f32, h: f32) -> [QuadVertex; QUAD_VERTEX_COUNT as usize] {
    let v = |xy: [f32; 2], uv: [f32; 2]| QuadVertex { xy, uv };
    [
        v([x, y + h], [0.0, 0.0]),
        v([x, y], [0.0, 1.0]),
        v([x + w, y], [1.0, 1.0]),
        v([x, y + h], [0.0, 0.0]),
        v([x + w, y], [1.0, 1.0]),
        v([x + w, y + h], [1.0, 0.0]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_the_viewport() {
        let quad = quad_vertices(-1.0, -1.0, 2.0, 2.0);
        for v in &quad {
            assert!(v.xy[0].abs() == 1.0 && v.xy[1].abs() == 1.0, "{v:?}");
        }
    }

    #[test]
    fn uv_origin_is_top_left() {
        let quad = quad_vertices(-1.0, -1.0, 2.0, 2.0);
        let upper_left = quad.iter().find(|v| v.xy == [-1.0, 1.0]).unwrap();
        let lower_right = quad.iter().find(|v| v.xy == [1.0, -1.0]).unwrap();
        assert_eq!(upper_left.uv, [0.0, 0.0]);
        assert_eq!(lower_right.uv, [1.0, 1.0]);
    }

    #[test]
    fn model_uniform_is_column_major_and_mirrored() {
        let m = AffineTransform::from_scale_translation((2.0, 3.0), (0.5, -0.5));
        let u = ModelUniform::new(m);
        assert_eq!(u.model[0], 2.0);
        assert_eq!(u.model[5], -3.0);
        assert_eq!(&u.model[12..14], &[0.5, 0.5]);
    }

    // ── offscreen orientation ─────────────────────────────────────────────

    /// Rasterizes the image quad into a one-pixel-wide target the way wgpu
    /// lays out a render target (row 0 is clip-space `y = +1`), sampling at
    /// pixel centers. The red channel of each pixel is `1 + source row`, or
    /// 0 where the quad does not cover it.
    fn rasterize_rows(model: AffineTransform, target_h: u32, image_h: u32) -> Vec<u8> {
        let clip_from_quad = glam::Mat4::from_cols_array(&ModelUniform::new(model).model);
        let quad_from_clip = clip_from_quad.inverse();
        let quad = quad_vertices(-1.0, -1.0, 2.0, 2.0);
        let v_top = quad.iter().find(|v| v.xy[1] == 1.0).unwrap().uv[1];
        let v_bottom = quad.iter().find(|v| v.xy[1] == -1.0).unwrap().uv[1];

        let mut rows = Vec::new();
        for row in 0..target_h {
            let clip_y = 1.0 - 2.0 * (row as f32 + 0.5) / target_h as f32;
            let q = quad_from_clip * glam::Vec4::new(0.0, clip_y, 0.0, 1.0);
            let tag = if (-1.0..=1.0).contains(&q.y) {
                let t = (q.y + 1.0) / 2.0;
                let v = v_bottom + (v_top - v_bottom) * t;
                ((v * image_h as f32) as u32).min(image_h - 1) as u8 + 1
            } else {
                0
            };
            rows.extend_from_slice(&[tag, 0, 0, 255]);
        }
        rows
    }

    #[test]
    fn captured_rows_agree_with_the_coordinate_mapping() {
        let (target_h, image_h) = (8, 4);
        let models = [
            AffineTransform::IDENTITY,
            AffineTransform::from_scale_translation((1.0, 1.0), (0.0, 0.5)),
            AffineTransform::from_scale_translation((1.0, 1.0), (0.0, -0.5)),
            AffineTransform::from_scale_translation((0.5, 0.5), (0.0, 0.25)),
        ];

        for model in models {
            let readback = rasterize_rows(model, target_h, image_h);
            let bitmap = super::super::bridge::flip_rows(&readback, 1, target_h, 4);

            let mut t = CoordinateTransformer::new(
                WindowSize::new(1, target_h).unwrap(),
                ImageSize::new(1, image_h).unwrap(),
            );
            t.set_model_transform(model);

            for y in 0..target_h {
                let n = t.window_pixels_to_normalized(0, y as i32);
                let expected = if n.y > -1.0 && n.y <= 1.0 {
                    t.window_pixels_to_image_pixels(0, y as i32).1 as u8 + 1
                } else {
                    0
                };
                assert_eq!(bitmap[y as usize * 4], expected, "{model:?}, window row {y}");
            }
        }
    }
}
