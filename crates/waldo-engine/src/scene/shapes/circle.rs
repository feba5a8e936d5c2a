use crate::coords::Vec2;
use crate::paint::Color;
use crate::scene::{DrawCmd, DrawList, Tag, ZIndex};

use super::Border;

/// Circle draw payload.
///
/// `fill` may be transparent; combined with a `border` this draws an outline.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleCmd {
    pub center: Vec2,
    pub radius: f32,
    pub fill: Color,
    pub border: Option<Border>,
}

impl CircleCmd {
    #[inline]
    pub fn new(center: Vec2, radius: f32, fill: Color, border: Option<Border>) -> Self {
        Self { center, radius, fill, border }
    }
}

impl DrawList {
    /// Records a circle draw command.
    #[inline]
    pub fn push_circle(
        &mut self,
        z: ZIndex,
        tag: Tag,
        center: Vec2,
        radius: f32,
        fill: Color,
        border: Option<Border>,
    ) {
        self.push(z, tag, DrawCmd::Circle(CircleCmd::new(center, radius, fill, border)));
    }

    /// Records an unfilled circle outline of the given stroke width.
    #[inline]
    pub fn push_ring(
        &mut self,
        z: ZIndex,
        tag: Tag,
        center: Vec2,
        radius: f32,
        width: f32,
        color: Color,
    ) {
        self.push_circle(
            z,
            tag,
            center,
            radius,
            Color::transparent(),
            Some(Border::new(width, color)),
        );
    }
}
