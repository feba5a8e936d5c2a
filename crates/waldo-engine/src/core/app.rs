use crate::coords::WindowSize;
use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    /// Nothing visible changed.
    Continue,
    /// Something changed; schedule a frame.
    Redraw,
    /// Leave the event loop.
    Exit,
}

impl AppControl {
    /// Combines two directives; `Exit` wins over `Redraw`, which wins over `Continue`.
    #[inline]
    pub fn merge(self, other: AppControl) -> AppControl {
        match (self, other) {
            (AppControl::Exit, _) | (_, AppControl::Exit) => AppControl::Exit,
            (AppControl::Redraw, _) | (_, AppControl::Redraw) => AppControl::Redraw,
            _ => AppControl::Continue,
        }
    }
}

/// Application contract implemented by the game.
///
/// Every callback runs on the event-loop thread. Frames are only produced
/// after a callback returned [`AppControl::Redraw`] (plus one initial frame).
pub trait App {
    /// Called for every translated input event.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called after the window surface was resized to a non-zero size.
    fn on_resize(&mut self, size: WindowSize) -> AppControl {
        let _ = size;
        AppControl::Redraw
    }

    /// Called when the window manager asks to close the window.
    fn on_close_requested(&mut self) -> AppControl {
        AppControl::Exit
    }

    /// Called for each requested frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the event loop is shutting down, while the GPU
    /// context is still alive.
    fn on_exit(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_the_strongest_directive() {
        use AppControl::*;
        assert_eq!(Continue.merge(Continue), Continue);
        assert_eq!(Continue.merge(Redraw), Redraw);
        assert_eq!(Redraw.merge(Exit), Exit);
        assert_eq!(Exit.merge(Continue), Exit);
    }
}
