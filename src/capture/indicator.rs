use super::detection::{luma, FrameDetector};
use crate::common::geometry::BoundingBox;
use crate::config::FireIndicatorConfig;
use image::RgbImage;

/// Reads the weapon-fired UI flag from a bright patch in a fixed HUD region.
pub struct FireIndicatorDetector {
    config: FireIndicatorConfig,
}

impl FireIndicatorDetector {
    pub fn new(config: FireIndicatorConfig) -> Self {
        Self { config }
    }
}

impl FrameDetector for FireIndicatorDetector {
    type Output = bool;

    fn detect(&self, pixels: &RgbImage) -> bool {
        let region = BoundingBox::from_fractions(self.config.region, pixels.dimensions());
        if region.area() == 0 {
            return false;
        }
        let lit = (region.y..region.y + region.height)
            .flat_map(|y| (region.x..region.x + region.width).map(move |x| (x, y)))
            .filter(|&(x, y)| luma(pixels.get_pixel(x, y)) >= self.config.min_luma as f32)
            .count();
        lit as f32 / region.area() as f32 >= self.config.min_fill
    }

    fn name(&self) -> &'static str {
        "FireIndicatorDetector"
    }
}
