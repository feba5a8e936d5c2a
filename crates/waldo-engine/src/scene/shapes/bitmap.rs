use std::rc::Rc;

use crate::coords::Vec2;
use crate::render::Bitmap;
use crate::scene::{DrawCmd, DrawList, Tag, ZIndex};

/// Static bitmap placed at `origin` (top-left), drawn at its native size.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapCmd {
    pub origin: Vec2,
    pub bitmap: Rc<Bitmap>,
}

impl BitmapCmd {
    #[inline]
    pub fn new(origin: Vec2, bitmap: Rc<Bitmap>) -> Self {
        Self { origin, bitmap }
    }
}

impl DrawList {
    /// Records a bitmap draw command.
    #[inline]
    pub fn push_bitmap(&mut self, z: ZIndex, tag: Tag, origin: Vec2, bitmap: Rc<Bitmap>) {
        self.push(z, tag, DrawCmd::Bitmap(BitmapCmd::new(origin, bitmap)));
    }
}
