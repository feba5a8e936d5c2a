use anyhow::{anyhow, Result};
use winit::window::Window;

use crate::coords::{Viewport, WindowSize};
use crate::device::{Gpu, SurfaceErrorAction};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

use super::app::AppControl;

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> WindowSize {
        self.gpu.size()
    }

    /// Acquires the next surface frame, calls `draw` with a ready
    /// [`RenderCtx`] and [`RenderTarget`], then presents.
    ///
    /// `clear` is handed to the renderer; the pass that first touches the
    /// frame is expected to clear with it. Recoverable surface errors skip
    /// or re-request the frame; unrecoverable ones are returned.
    pub fn present<F>(&mut self, clear: Color, draw: F) -> Result<AppControl>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>, Color),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("failed to acquire surface frame: {err}");
                let message = err.to_string();
                return surface_error_control(self.gpu.handle_surface_error(err), &message);
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            Viewport::from(self.gpu.size()),
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target, clear);
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        Ok(AppControl::Continue)
    }
}

fn surface_error_control(action: SurfaceErrorAction, message: &str) -> Result<AppControl> {
    match action {
        SurfaceErrorAction::Reconfigured => Ok(AppControl::Redraw),
        SurfaceErrorAction::SkipFrame => Ok(AppControl::Continue),
        SurfaceErrorAction::Fatal => Err(anyhow!("window surface failed: {message}")),
    }
}
