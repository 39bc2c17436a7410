use crate::coords::{Mat4, Vec3, ViewportSize};

/// Fixed perspective camera looking at the origin down -Z.
///
/// Only the aspect ratio changes at runtime; it follows the viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance of the eye from the origin along +Z.
    pub eye_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            eye_distance: 2.0,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, self.eye_distance),
            Vec3::default(),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    pub fn projection(&self, viewport: ViewportSize) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            viewport.aspect_ratio(),
            self.near,
            self.far,
        )
    }

    /// Returns `(view, projection)` for a frame rendered at `viewport`.
    pub fn matrices(&self, viewport: ViewportSize) -> (Mat4, Mat4) {
        (self.view(), self.projection(viewport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_tracks_viewport_aspect() {
        let cam = Camera::default();
        let wide = cam.projection(ViewportSize::new(800, 400));
        let square = cam.projection(ViewportSize::new(400, 400));
        assert!((wide.cols[0][0] * 2.0 - square.cols[0][0]).abs() < 1e-5);
    }

    #[test]
    fn view_does_not_depend_on_viewport() {
        let cam = Camera::default();
        let (a, _) = cam.matrices(ViewportSize::new(720, 576));
        let (b, _) = cam.matrices(ViewportSize::new(400, 300));
        assert_eq!(a, b);
    }
}
