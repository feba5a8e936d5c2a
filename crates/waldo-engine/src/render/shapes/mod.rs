//! Canvas shape renderers.

mod common;

pub mod bitmap;
pub mod circle;
pub mod line;
