//! Coordinate spaces and the conversions between them.
//!
//! Three spaces are in play:
//! - window pixels: integer, origin top-left, +Y down
//! - normalized device coordinates: `[-1, 1]` on both axes, origin center, +Y up
//! - image pixels: integer, origin top-left of the source image, +Y down
//!
//! Canvas geometry (markers, overlays) is expressed in window pixels as `f32`
//! and converted to clip space by the renderers through a viewport uniform.

mod size;
mod transform;
mod vec2;
mod viewport;

pub use size::{ImageSize, WindowSize};
pub use transform::{AffineTransform, CoordinateTransformer, NdcPoint};
pub use vec2::Vec2;
pub use viewport::Viewport;
