use std::rc::Rc;

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::coords::WindowSize;

use super::{Bitmap, RenderTarget};

/// Whether a [`FrameBridge`] currently has an open [`FrameScope`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BridgeState {
    Unbound,
    Scoped,
}

impl BridgeState {
    /// `Unbound -> Scoped`; fails if a scope is already open.
    fn bind(&mut self) -> Result<()> {
        anyhow::ensure!(
            *self == BridgeState::Unbound,
            "frame bridge is already bound to a frame"
        );
        *self = BridgeState::Scoped;
        Ok(())
    }

    /// Back to `Unbound` from any state.
    fn release(&mut self) {
        *self = BridgeState::Unbound;
    }
}

/// Offscreen color target plus a readback buffer, sized to one window size.
///
/// A frame is rendered into the offscreen texture inside a [`FrameScope`] and
/// read back as a top-down [`Bitmap`] when the scope ends. The bridge never
/// resizes; build a new one when the window size changes.
pub struct FrameBridge {
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: WindowSize,

    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_bytes_per_row: u32,

    state: BridgeState,
    bitmap: Option<Rc<Bitmap>>,
}

impl FrameBridge {
    /// Color format of the offscreen target.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, size: WindowSize) -> Result<Self> {
        let max = device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            size.width() <= max && size.height() <= max,
            "window {size} exceeds the device texture limit of {max}px"
        );

        let extent = wgpu::Extent3d {
            width: size.width(),
            height: size.height(),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("waldo offscreen frame"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_bytes_per_row = padded_bytes_per_row(size.width());
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("waldo frame readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(size.height()),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::debug!("frame bridge created for {size}");

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            size,
            texture,
            view,
            readback,
            padded_bytes_per_row,
            state: BridgeState::Unbound,
            bitmap: None,
        })
    }

    #[inline]
    pub fn size(&self) -> WindowSize {
        self.size
    }

    #[inline]
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Latest captured frame, if any.
    #[inline]
    pub fn bitmap(&self) -> Option<&Rc<Bitmap>> {
        self.bitmap.as_ref()
    }

    /// Opens a scope that renders into the offscreen texture.
    ///
    /// Fails if a scope is already open.
    pub fn begin_frame(&mut self) -> Result<FrameScope<'_>> {
        self.state.bind()?;
        Ok(FrameScope {
            bridge: self,
            encoder: None,
        })
    }
}

impl Drop for FrameBridge {
    fn drop(&mut self) {
        self.readback.destroy();
        self.texture.destroy();
    }
}

/// An open offscreen frame. Dropping it without [`end_frame`](Self::end_frame)
/// discards the recorded commands and unbinds the bridge.
pub struct FrameScope<'b> {
    bridge: &'b mut FrameBridge,
    encoder: Option<wgpu::CommandEncoder>,
}

impl FrameScope<'_> {
    #[inline]
    pub fn size(&self) -> WindowSize {
        self.bridge.size
    }

    /// Render target for the offscreen texture.
    pub fn target(&mut self) -> RenderTarget<'_> {
        let device = &self.bridge.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("waldo offscreen encoder"),
            })
        });
        RenderTarget::new(encoder, &self.bridge.view)
    }

    /// Submits the frame, reads it back and publishes it as a new bitmap.
    ///
    /// Blocks until the GPU has finished the copy.
    pub fn end_frame(mut self) -> Result<Rc<Bitmap>> {
        let bridge = &mut *self.bridge;
        let mut encoder = self.encoder.take().unwrap_or_else(|| {
            bridge
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("waldo offscreen encoder"),
                })
        });

        let (width, height) = (bridge.size.width(), bridge.size.height());

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &bridge.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &bridge.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bridge.padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        bridge.queue.submit(std::iter::once(encoder.finish()));

        let slice = bridge.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        bridge
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed waiting for frame readback")?;
        rx.recv()
            .context("frame readback was cancelled")?
            .context("failed to map frame readback buffer")?;

        let pixels = {
            let data = slice.get_mapped_range();
            flip_rows(&data, width, height, bridge.padded_bytes_per_row)
        };
        bridge.readback.unmap();

        let image = RgbaImage::from_raw(width, height, pixels)
            .context("readback size does not match the frame size")?;
        let bitmap = Rc::new(Bitmap::new(image).context("captured an empty frame")?);

        log::trace!("captured frame revision {}", bitmap.revision());
        bridge.bitmap = Some(bitmap.clone());
        Ok(bitmap)
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        self.bridge.state.release();
    }
}

/// Row stride of the readback buffer for a frame `width` pixels wide.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    wgpu::util::align_to(width * 4, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}

/// Strips row padding and reverses row order: bottom-up padded rows in,
/// tightly packed top-down RGBA rows out.
pub(crate) fn flip_rows(padded: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = width as usize * 4;
    let padded_row = padded_row as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for y in (0..height as usize).rev() {
        let start = y * padded_row;
        out.extend_from_slice(&padded[start..start + row]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{AffineTransform, CoordinateTransformer, ImageSize};
    use crate::render::RenderSurface;

    fn size(w: u32, h: u32) -> WindowSize {
        WindowSize::new(w, h).unwrap()
    }

    // ── scope state ───────────────────────────────────────────────────────

    #[test]
    fn binding_twice_fails() {
        let mut state = BridgeState::Unbound;
        state.bind().unwrap();
        assert_eq!(state, BridgeState::Scoped);
        assert!(state.bind().is_err());
        assert_eq!(state, BridgeState::Scoped);
    }

    #[test]
    fn release_allows_the_next_bind() {
        let mut state = BridgeState::Unbound;
        state.bind().unwrap();
        state.release();
        assert_eq!(state, BridgeState::Unbound);
        state.bind().unwrap();
    }

    // ── row layout ────────────────────────────────────────────────────────

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(640), 2560);
    }

    #[test]
    fn flip_reverses_rows_and_drops_padding() {
        // 1x3 frame, 8-byte padded rows; row index encoded in the red channel.
        let padded = [
            0, 0, 0, 255, 9, 9, 9, 9, //
            1, 0, 0, 255, 9, 9, 9, 9, //
            2, 0, 0, 255, 9, 9, 9, 9,
        ];
        let out = flip_rows(&padded, 1, 3, 8);
        assert_eq!(out, vec![2, 0, 0, 255, 1, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn flip_keeps_pixel_order_within_a_row() {
        let padded = [1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
        let out = flip_rows(&padded, 2, 2, 8);
        assert_eq!(out, vec![3, 3, 3, 3, 4, 4, 4, 4, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    // ── on a real device ──────────────────────────────────────────────────
    //
    // Skipped (pass trivially) on machines without any wgpu adapter.

    fn headless_gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }

    #[test]
    fn abandoned_scope_unbinds_the_bridge() {
        let Some((device, queue)) = headless_gpu() else { return };
        let mut bridge = FrameBridge::new(&device, &queue, size(4, 4)).unwrap();

        {
            let mut scope = bridge.begin_frame().unwrap();
            let _ = scope.target();
        }
        assert_eq!(bridge.state(), BridgeState::Unbound);
        assert!(bridge.bitmap().is_none());

        let scope = bridge.begin_frame().unwrap();
        let bitmap = scope.end_frame().unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (4, 4));
        assert_eq!(bridge.state(), BridgeState::Unbound);
    }

    #[test]
    fn leaked_scope_blocks_the_next_frame() {
        let Some((device, queue)) = headless_gpu() else { return };
        let mut bridge = FrameBridge::new(&device, &queue, size(2, 2)).unwrap();

        std::mem::forget(bridge.begin_frame().unwrap());
        assert_eq!(bridge.state(), BridgeState::Scoped);
        assert!(bridge.begin_frame().is_err());
    }

    #[test]
    fn captured_frame_matches_the_coordinate_mapping() {
        let Some((device, queue)) = headless_gpu() else { return };

        const ROWS: [[u8; 4]; 4] = [
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 255, 255],
        ];
        let mut image = RgbaImage::new(1, 4);
        for (y, rgba) in ROWS.iter().enumerate() {
            image.put_pixel(0, y as u32, image::Rgba(*rgba));
        }

        let window = size(1, 8);
        let model = AffineTransform::from_scale_translation((1.0, 1.0), (0.0, 0.5));
        let mut surface =
            RenderSurface::new(&device, &queue, &image, window, FrameBridge::FORMAT).unwrap();
        surface.set_model_transform(model);
        let mut bridge = FrameBridge::new(&device, &queue, window).unwrap();

        let mut scope = bridge.begin_frame().unwrap();
        surface.render(&mut scope.target());
        let bitmap = scope.end_frame().unwrap();

        let mut t = CoordinateTransformer::new(window, ImageSize::new(1, 4).unwrap());
        t.set_model_transform(model);
        for y in 0..8 {
            let n = t.window_pixels_to_normalized(0, y);
            let expected = if n.y > -1.0 && n.y <= 1.0 {
                ROWS[t.window_pixels_to_image_pixels(0, y).1 as usize]
            } else {
                [0, 0, 0, 0]
            };
            assert_eq!(bitmap.pixels().get_pixel(0, y as u32).0, expected, "window row {y}");
        }

        surface.destroy();
    }
}
