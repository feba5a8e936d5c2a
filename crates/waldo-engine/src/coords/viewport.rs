use super::WindowSize;

/// Viewport size in window pixels.
///
/// Renderers upload this as the basis for converting pixel positions to NDC.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

impl From<WindowSize> for Viewport {
    #[inline]
    fn from(size: WindowSize) -> Self {
        Self::new(size.width() as f32, size.height() as f32)
    }
}
