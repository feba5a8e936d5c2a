use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Static RGBA pixel buffer, rows top-down, straight alpha. The bitmap shader
/// premultiplies when sampling.
///
/// Every bitmap gets a process-unique revision on construction. Renderers key
/// their GPU uploads on it, so a new capture is always a new revision and an
/// unchanged `Rc<Bitmap>` is never uploaded twice.
#[derive(Clone)]
pub struct Bitmap {
    revision: u64,
    pixels: RgbaImage,
}

impl Bitmap {
    /// Wraps `pixels`; `None` if the image has no area.
    pub fn new(pixels: RgbaImage) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self {
            revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed),
            pixels,
        })
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("revision", &self.revision)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
