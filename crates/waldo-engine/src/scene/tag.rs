use std::fmt;

/// Label grouping canvas items that are created and deleted together.
///
/// Tags are static strings so they can be declared as constants next to the
/// code that owns the layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Tag(pub &'static str);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
