use std::fmt;

/// Window client-area size in window pixels.
///
/// Both dimensions are non-zero by construction. Platforms report `0 x 0` for
/// minimized windows; such sizes are rejected at the boundary instead of
/// reaching the coordinate math.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WindowSize {
    width: u32,
    height: u32,
}

impl WindowSize {
    /// Smallest representable size, `1 x 1`.
    pub const MIN: Self = Self { width: 1, height: 1 };

    /// Returns `None` if either dimension is zero.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    #[inline]
    pub const fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Integer center, truncated.
    #[inline]
    pub const fn center(self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Native resolution of the source image, in image pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    /// Returns `None` if either dimension is zero.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    #[inline]
    pub const fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(self) -> u32 {
        self.height
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(WindowSize::new(0, 10).is_none());
        assert!(WindowSize::new(10, 0).is_none());
        assert!(ImageSize::new(0, 0).is_none());
    }

    #[test]
    fn center_truncates() {
        let size = WindowSize::new(13, 7).unwrap();
        assert_eq!(size.center(), (6, 3));
    }

    #[test]
    fn display_is_width_by_height() {
        assert_eq!(WindowSize::new(1600, 1200).unwrap().to_string(), "1600x1200");
    }
}
