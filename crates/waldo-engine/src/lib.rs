//! Waldo engine crate.
//!
//! Owns the platform, GPU and canvas pieces the game is built on: the winit
//! window runtime, the wgpu device, offscreen image rendering with frame
//! readback, and a retained canvas of tagged shapes.

pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod window;
