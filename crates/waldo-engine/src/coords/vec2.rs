use core::ops::{Add, Sub};

/// Canvas position or offset in window pixels, `f32`, +Y down.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// From an integer window-pixel pair such as
    /// `CoordinateTransformer::normalized_to_window_pixels` returns.
    #[inline]
    pub fn from_pixels((x, y): (i32, i32)) -> Self {
        Self::new(x as f32, y as f32)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_pairs_convert_exactly() {
        assert_eq!(Vec2::from_pixels((-3, 1600)), Vec2::new(-3.0, 1600.0));
    }

    #[test]
    fn offsets_add_and_subtract() {
        let c = Vec2::new(10.0, 20.0);
        let d = Vec2::new(4.0, -4.0);
        assert_eq!(c + d, Vec2::new(14.0, 16.0));
        assert_eq!(c - d, Vec2::new(6.0, 24.0));
    }
}
