//! GPU rendering subsystem.
//!
//! Two paths share the device:
//! - offscreen: [`RenderSurface`] draws the puzzle image into a
//!   [`FrameBridge`], which reads the frame back as a [`Bitmap`]
//! - presentation: [`CanvasRenderer`] draws a retained `scene::DrawList`
//!   (the captured bitmap plus marker shapes) onto the window surface
//!
//! Canvas geometry is in window pixels (top-left origin, +Y down); each shape
//! shader converts to NDC using a viewport uniform.

mod bitmap;
mod bridge;
mod canvas;
mod ctx;
mod surface;

pub mod shapes;

pub use bitmap::Bitmap;
pub use bridge::{BridgeState, FrameBridge, FrameScope};
pub use canvas::CanvasRenderer;
pub use ctx::{RenderCtx, RenderTarget};
pub use surface::RenderSurface;
