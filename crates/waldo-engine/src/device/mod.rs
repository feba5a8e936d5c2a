//! GPU device + window surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain) for the game window
//! - acquiring frames and providing encoders/views for presentation
//!
//! Offscreen rendering (the image quad and its readback) borrows the device and
//! queue from here; see `render::RenderSurface` and `render::FrameBridge`.

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
