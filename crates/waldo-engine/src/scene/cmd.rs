use crate::scene::shapes::bitmap::BitmapCmd;
use crate::scene::shapes::circle::CircleCmd;
use crate::scene::shapes::line::LineCmd;

/// Renderer-agnostic draw command.
///
/// Extending the canvas:
/// - add a new shape module under `scene::shapes::*`
/// - add a new variant here
/// - implement push helpers inside that shape module
/// - add a matching renderer under `render::shapes::*`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Bitmap(BitmapCmd),
    Circle(CircleCmd),
    Line(LineCmd),
}
