//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the game,
//! without leaking runtime internals into game code.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
