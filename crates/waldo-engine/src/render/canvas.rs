use crate::paint::Color;
use crate::scene::DrawList;

use super::shapes::bitmap::BitmapRenderer;
use super::shapes::circle::CircleRenderer;
use super::shapes::line::LineRenderer;
use super::{RenderCtx, RenderTarget};

/// Presents a retained [`DrawList`] onto a render target.
///
/// Draws bitmaps first, then circles, then lines; within each kind items
/// follow the list's paint order.
#[derive(Default)]
pub struct CanvasRenderer {
    bitmaps: BitmapRenderer,
    circles: CircleRenderer,
    lines: LineRenderer,
}

impl CanvasRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        clear: Color,
        draw_list: &mut DrawList,
    ) {
        let bitmaps = self.bitmaps.prepare(ctx, draw_list);
        let circles = self.circles.prepare(ctx, draw_list);
        let lines = self.lines.prepare(ctx, draw_list);

        let [r, g, b, a] = clear.to_array().map(f64::from);
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("waldo canvas pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if bitmaps > 0 {
            self.bitmaps.draw(&mut rpass, 0..bitmaps);
        }
        if circles > 0 {
            self.circles.draw(&mut rpass, 0..circles);
        }
        if lines > 0 {
            self.lines.draw(&mut rpass, 0..lines);
        }
    }
}
