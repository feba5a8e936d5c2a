//! Canvas feedback for guesses: failure markers and the success ring.

use waldo_engine::coords::{CoordinateTransformer, NdcPoint, Vec2};
use waldo_engine::paint::Color;
use waldo_engine::scene::{DrawList, Tag, ZIndex};

/// Captured base frame.
pub const FRAME: Tag = Tag("frame");
/// Missed guesses.
pub const FAILURES: Tag = Tag("failures");
/// Success overlay.
pub const SUCCESS: Tag = Tag("success");

pub const FRAME_Z: ZIndex = ZIndex::new(0);
pub const FAILURES_Z: ZIndex = ZIndex::new(1);
pub const SUCCESS_Z: ZIndex = ZIndex::new(2);

pub const FAILURE_STROKE: f32 = 3.0;
pub const SUCCESS_STROKE: f32 = 5.0;

/// A missed guess, recorded in normalized coordinates so it survives resizes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FailureMarker(pub NdcPoint);

impl FailureMarker {
    /// Draws a red ring with an X through it at the marker's current pixel
    /// position. Returns `false` when the marker is off-screen.
    pub fn draw(&self, canvas: &mut DrawList, transformer: &CoordinateTransformer, radius: i32) -> bool {
        let Some(px) = transformer.normalized_to_window_pixels(self.0) else {
            log::trace!("failure marker {:?} is off-screen", self.0);
            return false;
        };

        let center = Vec2::from_pixels(px);
        let r = radius as f32;
        let down = Vec2::new(r, r);
        let up = Vec2::new(r, -r);
        let red = Color::red();

        canvas.push_ring(FAILURES_Z, FAILURES, center, r, FAILURE_STROKE, red);
        canvas.push_line(FAILURES_Z, FAILURES, center - down, center + down, FAILURE_STROKE, red);
        canvas.push_line(FAILURES_Z, FAILURES, center - up, center + up, FAILURE_STROKE, red);
        true
    }
}

/// Green ring, twice the marker radius, around the winning click.
pub fn draw_success(
    canvas: &mut DrawList,
    transformer: &CoordinateTransformer,
    at: NdcPoint,
    radius: i32,
) -> bool {
    let Some(px) = transformer.normalized_to_window_pixels(at) else {
        return false;
    };
    canvas.push_ring(
        SUCCESS_Z,
        SUCCESS,
        Vec2::from_pixels(px),
        (2 * radius) as f32,
        SUCCESS_STROKE,
        Color::green(),
    );
    true
}
