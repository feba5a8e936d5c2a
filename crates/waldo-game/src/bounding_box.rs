use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Location of the target in image-pixel coordinates.
///
/// Edges are inclusive: a point on `right` or `bottom` is inside.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    /// Returns `None` for an inverted box.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        let b = Self { left, top, right, bottom };
        b.is_valid().then_some(b)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.left..=self.right).contains(&x) && (self.top..=self.bottom).contains(&y)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Radius of a missed-guess marker: half the shorter side, truncated.
    #[inline]
    pub fn marker_radius(&self) -> i32 {
        self.width().min(self.height()) / 2
    }

    /// Reads and validates a JSON record.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadRecord {
            path: path.to_path_buf(),
            source,
        })?;

        let b: BoundingBox =
            serde_json::from_str(&text).map_err(|source| ConfigError::ParseRecord {
                path: path.to_path_buf(),
                source,
            })?;

        if !b.is_valid() {
            return Err(ConfigError::InvertedBox(b));
        }
        Ok(b)
    }
}
