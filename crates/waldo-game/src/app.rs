use std::rc::Rc;

use anyhow::{Context, Result};
use image::RgbaImage;
use waldo_engine::coords::{CoordinateTransformer, WindowSize};
use waldo_engine::core::{App, AppControl, FrameCtx};
use waldo_engine::input::InputEvent;
use waldo_engine::paint::Color;
use waldo_engine::render::{Bitmap, CanvasRenderer, FrameBridge, RenderSurface};

use crate::bounding_box::BoundingBox;
use crate::controller::{GameController, Outcome, Stage};
use crate::dialogs::{Prompt, RfdPrompt};
use crate::events::{EventQueue, GameEvent};

/// Offscreen image rendering on the GPU: the image quad plus the bridge that
/// reads its frames back.
struct GpuStage {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: RenderSurface,
    /// Built on the first resize, rebuilt on every one after.
    bridge: Option<FrameBridge>,
}

impl GpuStage {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage, size: WindowSize) -> Result<Self> {
        let surface = RenderSurface::new(device, queue, image, size, FrameBridge::FORMAT)
            .context("failed to upload the puzzle image")?;
        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            surface,
            bridge: None,
        })
    }

    fn destroy(self) {
        drop(self.bridge);
        self.surface.destroy();
    }
}

impl Stage for GpuStage {
    fn transformer(&self) -> &CoordinateTransformer {
        self.surface.transformer()
    }

    fn resize(&mut self, size: WindowSize) -> Result<()> {
        self.surface.resize(size);
        // Release the old target before allocating the new one.
        self.bridge = None;
        self.bridge = Some(
            FrameBridge::new(&self.device, &self.queue, size)
                .with_context(|| format!("failed to create the offscreen frame for {size}"))?,
        );
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Rc<Bitmap>> {
        let bridge = self.bridge.as_mut().context("frame captured before the first resize")?;
        let mut scope = bridge.begin_frame()?;
        {
            let mut target = scope.target();
            self.surface.render(&mut target);
        }
        scope.end_frame().context("failed to read back the offscreen frame")
    }
}

/// Runs the dialog an outcome asks for and decides whether the game goes on.
fn resolve_outcome<P: Prompt>(outcome: Outcome, prompt: &P, control: AppControl) -> AppControl {
    match outcome {
        Outcome::Celebrate => {
            prompt.celebrate();
            AppControl::Exit
        }
        Outcome::ConfirmExit if prompt.confirm_quit() => AppControl::Exit,
        _ => control,
    }
}

/// The game as an engine app.
///
/// Platform callbacks only enqueue [`GameEvent`]s and request a frame; the
/// queue is drained at the start of each frame.
pub struct WaldoApp {
    image: RgbaImage,
    controller: GameController,
    events: EventQueue,
    stage: Option<GpuStage>,
    canvas: CanvasRenderer,
    error: Option<anyhow::Error>,
}

impl WaldoApp {
    pub fn new(image: RgbaImage, bbox: BoundingBox) -> Self {
        Self {
            image,
            controller: GameController::new(bbox),
            events: EventQueue::new(),
            stage: None,
            canvas: CanvasRenderer::new(),
            error: None,
        }
    }

    /// Error that ended the session, if any.
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn enqueue(&mut self, ev: GameEvent) -> AppControl {
        self.events.push(ev);
        AppControl::Redraw
    }

    fn fail(&mut self, err: anyhow::Error) -> AppControl {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        AppControl::Exit
    }
}

impl App for WaldoApp {
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        match GameEvent::from_input(event) {
            Some(ev) => self.enqueue(ev),
            None => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, size: WindowSize) -> AppControl {
        self.enqueue(GameEvent::Resize(size))
    }

    fn on_close_requested(&mut self) -> AppControl {
        self.enqueue(GameEvent::CloseRequested)
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.stage.is_none() {
            let size = ctx.size();
            match GpuStage::new(ctx.gpu.device(), ctx.gpu.queue(), &self.image, size) {
                Ok(stage) => {
                    self.stage = Some(stage);
                    self.events.push(GameEvent::Resize(size));
                }
                Err(err) => return self.fail(err),
            }
        }

        let Some(stage) = self.stage.as_mut() else {
            return AppControl::Continue;
        };
        let outcome = match self.events.drain(&mut self.controller, stage) {
            Ok(outcome) => outcome,
            Err(err) => return self.fail(err),
        };
        if outcome != Outcome::Continue {
            log::debug!(
                "session {:?}: {} failed guesses, {} canvas items",
                self.controller.state(),
                self.controller.markers().len(),
                self.controller.canvas().items().len()
            );
        }

        let canvas = &mut self.canvas;
        let draw_list = self.controller.canvas_mut();
        let presented = ctx.present(Color::black(), |rctx, target, clear| {
            canvas.render(rctx, target, clear, draw_list);
        });
        let control = match presented {
            Ok(control) => control,
            Err(err) => return self.fail(err),
        };

        // Dialogs come after presenting so the latest feedback is on screen.
        resolve_outcome(outcome, &RfdPrompt::new(ctx.window), control)
    }

    fn on_exit(&mut self) {
        if let Some(stage) = self.stage.take() {
            stage.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Answers the quit question with a fixed reply and counts dialogs.
    struct ScriptedPrompt {
        quit: bool,
        asked: Cell<u32>,
        celebrated: Cell<u32>,
    }

    impl ScriptedPrompt {
        fn answering(quit: bool) -> Self {
            Self {
                quit,
                asked: Cell::new(0),
                celebrated: Cell::new(0),
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn confirm_quit(&self) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.quit
        }

        fn celebrate(&self) {
            self.celebrated.set(self.celebrated.get() + 1);
        }
    }

    // ── dialogs ───────────────────────────────────────────────────────────

    #[test]
    fn confirmed_quit_exits() {
        let prompt = ScriptedPrompt::answering(true);
        let control = resolve_outcome(Outcome::ConfirmExit, &prompt, AppControl::Continue);
        assert_eq!(control, AppControl::Exit);
        assert_eq!(prompt.asked.get(), 1);
    }

    #[test]
    fn cancelled_quit_keeps_playing() {
        let prompt = ScriptedPrompt::answering(false);
        let control = resolve_outcome(Outcome::ConfirmExit, &prompt, AppControl::Redraw);
        assert_eq!(control, AppControl::Redraw);
        assert_eq!(prompt.asked.get(), 1);
    }

    #[test]
    fn celebration_always_exits() {
        let prompt = ScriptedPrompt::answering(false);
        let control = resolve_outcome(Outcome::Celebrate, &prompt, AppControl::Continue);
        assert_eq!(control, AppControl::Exit);
        assert_eq!(prompt.celebrated.get(), 1);
        assert_eq!(prompt.asked.get(), 0);
    }

    #[test]
    fn plain_outcomes_show_no_dialog() {
        let prompt = ScriptedPrompt::answering(true);
        for outcome in [Outcome::Continue, Outcome::Redraw] {
            assert_eq!(resolve_outcome(outcome, &prompt, AppControl::Redraw), AppControl::Redraw);
        }
        assert_eq!(prompt.asked.get() + prompt.celebrated.get(), 0);
    }

    // ── session errors ────────────────────────────────────────────────────

    fn app() -> WaldoApp {
        WaldoApp::new(RgbaImage::new(4, 4), BoundingBox::new(0, 0, 1, 1).unwrap())
    }

    #[test]
    fn failure_exits_and_is_returned() {
        let mut app = app();
        assert_eq!(app.fail(anyhow::anyhow!("window surface failed: out of memory")), AppControl::Exit);
        let err = app.finish().unwrap_err();
        assert!(err.to_string().contains("out of memory"));
    }

    #[test]
    fn first_failure_wins() {
        let mut app = app();
        app.fail(anyhow::anyhow!("first"));
        app.fail(anyhow::anyhow!("second"));
        assert_eq!(app.finish().unwrap_err().to_string(), "first");
    }

    #[test]
    fn clean_session_finishes_ok() {
        assert!(app().finish().is_ok());
    }

    #[test]
    fn platform_events_are_queued_for_the_next_frame() {
        let mut app = app();
        assert_eq!(app.on_close_requested(), AppControl::Redraw);
        assert_eq!(app.on_resize(WindowSize::new(8, 8).unwrap()), AppControl::Redraw);
        assert_eq!(app.events.len(), 2);
    }
}
