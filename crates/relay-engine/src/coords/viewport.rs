/// Viewport size in physical pixels.
///
/// This is the pixel rectangle the pipeline renders into. It is written by the
/// control thread on resize and read by the render thread once per frame, so it
/// is always copied as a whole pair.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` when both dimensions are non-zero.
    ///
    /// A minimized window reports a zero-sized viewport; such frames are skipped.
    #[inline]
    pub fn is_drawable(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width divided by height, with each side floored at one pixel.
    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for ViewportSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_of_pal_frame() {
        let vp = ViewportSize::new(720, 576);
        assert!((vp.aspect_ratio() - 1.25).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        let vp = ViewportSize::new(640, 0);
        assert_eq!(vp.aspect_ratio(), 640.0);
        assert!(!vp.is_drawable());
    }
}
