//! Retained canvas model.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands across frames
//! - group items under tags so a whole layer can be replaced at once
//! - provide deterministic ordering (z-index + insertion order)
//! - keep shape-specific helpers isolated per shape file under `scene::shapes`

mod cmd;
mod list;
mod order;
mod tag;

pub mod shapes;

pub use cmd::DrawCmd;
pub use list::{DrawItem, DrawList};
pub use order::{SortKey, ZIndex};
pub use shapes::Border;
pub use tag::Tag;
