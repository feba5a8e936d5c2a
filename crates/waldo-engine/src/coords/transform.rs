use glam::{DMat4, DVec3, DVec4};

use super::{ImageSize, WindowSize};

/// Point in normalized device coordinates.
///
/// `[-1, 1]` on both axes for on-screen points, origin at the center, +Y up.
/// Values outside that range are legal and describe off-screen positions.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct NdcPoint {
    pub x: f64,
    pub y: f64,
}

impl NdcPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if the point lies inside the closed square `[-1, 1] x [-1, 1]`.
    #[inline]
    pub fn is_on_screen(self) -> bool {
        (-1.0..=1.0).contains(&self.x) && (-1.0..=1.0).contains(&self.y)
    }
}

/// Model transform applied to the image quad before projection.
///
/// Stored as a full 4x4 matrix so it can be uploaded to the vertex shader
/// as-is. Only the xy plane is meaningful for the image quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AffineTransform(DMat4);

impl AffineTransform {
    pub const IDENTITY: Self = Self(DMat4::IDENTITY);

    #[inline]
    pub const fn from_matrix(matrix: DMat4) -> Self {
        Self(matrix)
    }

    /// Scale about the origin followed by a translation, both in NDC units.
    pub fn from_scale_translation(scale: (f64, f64), translation: (f64, f64)) -> Self {
        Self(DMat4::from_scale_rotation_translation(
            DVec3::new(scale.0, scale.1, 1.0),
            glam::DQuat::IDENTITY,
            DVec3::new(translation.0, translation.1, 0.0),
        ))
    }

    #[inline]
    pub fn matrix(&self) -> DMat4 {
        self.0
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    /// Transforms `p` as the homogeneous point `(x, y, 0, 1)`.
    #[inline]
    pub fn apply(&self, p: NdcPoint) -> NdcPoint {
        let v = self.0 * DVec4::new(p.x, p.y, 0.0, 1.0);
        NdcPoint::new(v.x, v.y)
    }

    /// Column-major `f32` matrix for uniform upload.
    #[inline]
    pub fn to_cols_array_f32(&self) -> [f32; 16] {
        self.0.as_mat4().to_cols_array()
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Converts between window pixels, normalized device coordinates and image
/// pixels for the current window size, image size and model transform.
///
/// All pixel outputs are truncated toward zero, never rounded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateTransformer {
    window: WindowSize,
    image: ImageSize,
    model: AffineTransform,
    model_inverse: AffineTransform,
}

impl CoordinateTransformer {
    pub fn new(window: WindowSize, image: ImageSize) -> Self {
        Self {
            window,
            image,
            model: AffineTransform::IDENTITY,
            model_inverse: AffineTransform::IDENTITY,
        }
    }

    #[inline]
    pub fn window_size(&self) -> WindowSize {
        self.window
    }

    #[inline]
    pub fn image_size(&self) -> ImageSize {
        self.image
    }

    #[inline]
    pub fn model_transform(&self) -> AffineTransform {
        self.model
    }

    #[inline]
    pub fn set_window_size(&mut self, window: WindowSize) {
        self.window = window;
    }

    /// Copy of this transformer for a different window size.
    #[inline]
    pub fn with_window_size(mut self, window: WindowSize) -> Self {
        self.window = window;
        self
    }

    pub fn set_model_transform(&mut self, model: AffineTransform) {
        self.model = model;
        self.model_inverse = model.inverse();
    }

    /// Window pixels (top-left origin) to normalized coordinates, undoing the
    /// model transform.
    ///
    /// Input outside the window extrapolates linearly.
    pub fn window_pixels_to_normalized(&self, x_px: i32, y_px: i32) -> NdcPoint {
        debug_assert!(self.window.width() > 0 && self.window.height() > 0);
        let u = f64::from(x_px) / f64::from(self.window.width());
        let v = f64::from(y_px) / f64::from(self.window.height());

        let on_screen = NdcPoint::new(2.0 * u - 1.0, 1.0 - 2.0 * v);
        self.model_inverse.apply(on_screen)
    }

    /// Normalized coordinates to window pixels, applying the model transform.
    ///
    /// Returns `None` when the transformed point is off-screen.
    pub fn normalized_to_window_pixels(&self, p: NdcPoint) -> Option<(i32, i32)> {
        let on_screen = self.model.apply(p);
        if !on_screen.is_on_screen() {
            return None;
        }

        let u = 0.5 * on_screen.x + 0.5;
        let v = 0.5 * on_screen.y + 0.5;

        let x_px = (u * f64::from(self.window.width())) as i32;
        let y_px = ((1.0 - v) * f64::from(self.window.height())) as i32;
        Some((x_px, y_px))
    }

    /// Window pixels to source-image pixels (both top-left origin).
    pub fn window_pixels_to_image_pixels(&self, x_px: i32, y_px: i32) -> (i32, i32) {
        let p = self.window_pixels_to_normalized(x_px, y_px);

        let u = 0.5 * p.x + 0.5;
        let v = 0.5 * p.y + 0.5;

        let x_img = (u * f64::from(self.image.width())) as i32;
        let y_img = ((1.0 - v) * f64::from(self.image.height())) as i32;
        (x_img, y_img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer(window: (u32, u32), image: (u32, u32)) -> CoordinateTransformer {
        CoordinateTransformer::new(
            WindowSize::new(window.0, window.1).unwrap(),
            ImageSize::new(image.0, image.1).unwrap(),
        )
    }

    // ── window -> normalized ──────────────────────────────────────────────

    #[test]
    fn top_left_pixel_is_upper_left_corner() {
        let t = transformer((12, 12), (48, 48));
        assert_eq!(t.window_pixels_to_normalized(0, 0), NdcPoint::new(-1.0, 1.0));
    }

    #[test]
    fn right_edge_middle_is_positive_x_axis() {
        let t = transformer((12, 12), (48, 48));
        assert_eq!(t.window_pixels_to_normalized(12, 6), NdcPoint::new(1.0, 0.0));
    }

    #[test]
    fn outside_window_extrapolates() {
        let t = transformer((10, 10), (10, 10));
        assert_eq!(t.window_pixels_to_normalized(20, -5), NdcPoint::new(3.0, 2.0));
    }

    // ── normalized -> window ──────────────────────────────────────────────

    #[test]
    fn upper_left_corner_is_top_left_pixel() {
        let t = transformer((12, 12), (48, 48));
        assert_eq!(t.normalized_to_window_pixels(NdcPoint::new(-1.0, 1.0)), Some((0, 0)));
    }

    #[test]
    fn positive_x_axis_is_right_edge_middle() {
        let t = transformer((12, 12), (48, 48));
        assert_eq!(t.normalized_to_window_pixels(NdcPoint::new(1.0, 0.0)), Some((12, 6)));
    }

    #[test]
    fn off_screen_points_have_no_pixel_position() {
        let t = transformer((12, 12), (48, 48));
        for p in [
            NdcPoint::new(1.0001, 0.0),
            NdcPoint::new(-1.5, 0.0),
            NdcPoint::new(0.0, 2.0),
            NdcPoint::new(0.0, -1.01),
        ] {
            assert_eq!(t.normalized_to_window_pixels(p), None, "{p:?}");
        }
    }

    #[test]
    fn pixels_truncate_instead_of_rounding() {
        let t = transformer((10, 10), (10, 10));
        // u = 0.59 -> 5.9 px, v = 0.41 -> (1 - 0.41) * 10 = 5.9 px
        assert_eq!(t.normalized_to_window_pixels(NdcPoint::new(0.18, -0.18)), Some((5, 5)));
    }

    #[test]
    fn round_trip_is_within_one_pixel() {
        for (w, h) in [(12, 12), (640, 480), (1599, 1201), (7, 3)] {
            let t = transformer((w, h), (48, 48));
            for x in 0..=w as i32 {
                for y in 0..=h as i32 {
                    let n = t.window_pixels_to_normalized(x, y);
                    let (bx, by) = t
                        .normalized_to_window_pixels(n)
                        .expect("in-window points stay on screen");
                    assert!((bx - x).abs() <= 1 && (by - y).abs() <= 1, "({x},{y}) -> ({bx},{by})");
                }
            }
        }
    }

    // ── window -> image ───────────────────────────────────────────────────

    #[test]
    fn window_origin_is_image_origin() {
        let t = transformer((12, 12), (48, 48));
        assert_eq!(t.window_pixels_to_image_pixels(0, 0), (0, 0));
    }

    #[test]
    fn window_pixels_scale_to_image_resolution() {
        let t = transformer((12, 12), (48, 48));
        assert_eq!(t.window_pixels_to_image_pixels(12, 6), (48, 24));
    }

    #[test]
    fn non_square_window_stretches_independently() {
        let t = transformer((100, 50), (1000, 1000));
        assert_eq!(t.window_pixels_to_image_pixels(25, 25), (250, 500));
    }

    #[test]
    fn resize_changes_the_mapping() {
        let mut t = transformer((12, 12), (48, 48));
        t.set_window_size(WindowSize::new(24, 24).unwrap());
        assert_eq!(t.window_pixels_to_image_pixels(12, 6), (24, 12));
    }

    #[test]
    fn with_window_size_leaves_the_original_untouched() {
        let t = transformer((12, 12), (48, 48));
        let bigger = t.with_window_size(WindowSize::new(24, 24).unwrap());
        assert_eq!(t.window_size(), WindowSize::new(12, 12).unwrap());
        assert_eq!(bigger.normalized_to_window_pixels(NdcPoint::new(1.0, 0.0)), Some((24, 12)));
    }

    // ── model transform ───────────────────────────────────────────────────

    #[test]
    fn model_transform_is_undone_on_the_way_in() {
        let mut t = transformer((10, 10), (10, 10));
        t.set_model_transform(AffineTransform::from_scale_translation((2.0, 2.0), (0.0, 0.0)));
        assert_eq!(t.window_pixels_to_normalized(10, 5), NdcPoint::new(0.5, 0.0));
    }

    #[test]
    fn model_transform_can_push_points_off_screen() {
        let mut t = transformer((10, 10), (10, 10));
        t.set_model_transform(AffineTransform::from_scale_translation((1.0, 1.0), (0.5, 0.0)));
        assert_eq!(t.normalized_to_window_pixels(NdcPoint::new(0.75, 0.0)), None);
        assert_eq!(t.normalized_to_window_pixels(NdcPoint::new(-1.0, 0.0)), Some((2, 5)));
    }

    #[test]
    fn identity_is_the_default() {
        assert_eq!(AffineTransform::default(), AffineTransform::IDENTITY);
        let p = NdcPoint::new(0.25, -0.75);
        assert_eq!(AffineTransform::IDENTITY.apply(p), p);
    }
}
