use crate::coords::{ColorRgba, ViewportSize};

use super::Camera;

/// Per-coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Viewport used until the first resize notification arrives.
    pub initial_viewport: ViewportSize,

    /// Color every frame is cleared to before the renderable draws.
    pub clear_color: ColorRgba,

    pub camera: Camera,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            initial_viewport: ViewportSize::new(720, 576),
            clear_color: ColorRgba::new(0.1, 0.1, 0.12, 1.0),
            camera: Camera::default(),
        }
    }
}
