use std::rc::Rc;

use anyhow::Result;
use waldo_engine::coords::{CoordinateTransformer, NdcPoint, Vec2, WindowSize};
use waldo_engine::input::Key;
use waldo_engine::render::Bitmap;
use waldo_engine::scene::DrawList;

use crate::bounding_box::BoundingBox;
use crate::markers::{self, FailureMarker, FAILURES, FRAME, FRAME_Z, SUCCESS};

/// What the controller needs from the rendering side.
///
/// Implemented over the GPU by the app; tests use an in-memory fake.
pub trait Stage {
    fn transformer(&self) -> &CoordinateTransformer;

    /// Tracks a new window size and rebuilds the offscreen frame target.
    fn resize(&mut self, size: WindowSize) -> Result<()>;

    /// Renders the image offscreen and returns the captured frame.
    fn capture_frame(&mut self) -> Result<Rc<Bitmap>>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionState {
    Playing,
    /// Terminal.
    Won,
}

/// Follow-up requested by a handler.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Continue,
    Redraw,
    /// Ask whether to quit; exit on OK.
    ConfirmExit,
    /// Show the congratulation dialog, then exit.
    Celebrate,
}

impl Outcome {
    /// Keeps the strongest request: dialogs over redraws over nothing.
    pub fn merge(self, other: Outcome) -> Outcome {
        use Outcome::*;
        match (self, other) {
            (Celebrate, _) | (_, Celebrate) => Celebrate,
            (ConfirmExit, _) | (_, ConfirmExit) => ConfirmExit,
            (Redraw, _) | (_, Redraw) => Redraw,
            _ => Continue,
        }
    }
}

pub struct GameController {
    bbox: BoundingBox,
    state: SessionState,
    markers: Vec<FailureMarker>,
    success: Option<NdcPoint>,
    canvas: DrawList,
}

impl GameController {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            state: SessionState::Playing,
            markers: Vec::new(),
            success: None,
            canvas: DrawList::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn markers(&self) -> &[FailureMarker] {
        &self.markers
    }

    #[inline]
    pub fn canvas(&self) -> &DrawList {
        &self.canvas
    }

    /// Mutable canvas for presentation (paint order is cached lazily).
    #[inline]
    pub fn canvas_mut(&mut self) -> &mut DrawList {
        &mut self.canvas
    }

    pub fn on_click<S: Stage + ?Sized>(&mut self, stage: &S, x_px: i32, y_px: i32) -> Outcome {
        if self.state == SessionState::Won {
            log::debug!("click at ({x_px}, {y_px}) ignored, already won");
            return Outcome::Continue;
        }

        let transformer = stage.transformer();
        let (x_img, y_img) = transformer.window_pixels_to_image_pixels(x_px, y_px);
        let at = transformer.window_pixels_to_normalized(x_px, y_px);

        if self.bbox.contains(x_img, y_img) {
            log::info!("found at window ({x_px}, {y_px}), image ({x_img}, {y_img})");
            self.state = SessionState::Won;
            self.success = Some(at);
            markers::draw_success(&mut self.canvas, transformer, at, self.bbox.marker_radius());
            return Outcome::Celebrate;
        }

        log::debug!("miss at window ({x_px}, {y_px}), image ({x_img}, {y_img})");
        let marker = FailureMarker(at);
        marker.draw(&mut self.canvas, transformer, self.bbox.marker_radius());
        self.markers.push(marker);
        Outcome::Redraw
    }

    /// Rebuilds the whole canvas for the new size: fresh base frame, then
    /// every marker at its recomputed position.
    pub fn on_resize<S: Stage + ?Sized>(&mut self, stage: &mut S, size: WindowSize) -> Result<Outcome> {
        stage.resize(size)?;
        let frame = stage.capture_frame()?;

        self.canvas.delete_tagged(FRAME);
        self.canvas.push_bitmap(FRAME_Z, FRAME, Vec2::zero(), frame);
        self.redraw_overlays(stage.transformer());

        log::debug!("resized to {size}, {} markers redrawn", self.markers.len());
        Ok(Outcome::Redraw)
    }

    pub fn on_key_press(&mut self, key: Key) -> Outcome {
        match key {
            Key::Escape => Outcome::ConfirmExit,
            _ => Outcome::Continue,
        }
    }

    pub fn on_close_requested(&mut self) -> Outcome {
        Outcome::ConfirmExit
    }

    fn redraw_overlays(&mut self, transformer: &CoordinateTransformer) {
        self.canvas.delete_tagged(FAILURES);
        self.canvas.delete_tagged(SUCCESS);

        let radius = self.bbox.marker_radius();
        for marker in &self.markers {
            marker.draw(&mut self.canvas, transformer, radius);
        }
        if let Some(at) = self.success {
            markers::draw_success(&mut self.canvas, transformer, at, radius);
        }
    }
}
