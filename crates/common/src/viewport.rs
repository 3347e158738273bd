use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Device pixel ratios above this are clamped; denser targets cost fill rate
/// without a visible difference.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Size of the host display surface in logical pixels plus its pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Build from a logical size and the raw device pixel ratio.
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: device_pixel_ratio.min(MAX_PIXEL_RATIO),
        }
    }

    /// Build from a physical size as reported by the windowing system.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = scale_factor.max(f64::EPSILON);
        Self::new(
            (width as f64 / scale) as f32,
            (height as f64 / scale) as f32,
            scale as f32,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    /// Drawing-buffer resolution, the value every resolution uniform carries.
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width * self.pixel_ratio, self.height * self.pixel_ratio)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}
