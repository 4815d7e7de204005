use super::detection::{luma, FrameDetector};
use crate::common::geometry::{BoundingBox, Point};
use crate::config::{ColorRange, ReticleConfig};
use image::RgbImage;

/// Locates the reticle inside a fixed search region around its anchor.
pub struct CrosshairDetector {
    config: ReticleConfig,
}

#[derive(Default)]
struct MaskStats {
    count: usize,
    sum_x: f64,
    sum_y: f64,
    min: (u32, u32),
    max: (u32, u32),
    mask_luma: f64,
    other_luma: f64,
    other_count: usize,
}

impl CrosshairDetector {
    pub fn new(config: ReticleConfig) -> Self {
        Self { config }
    }

    fn search_region(&self, dimensions: (u32, u32)) -> BoundingBox {
        let (width, height) = dimensions;
        let anchor_x = ((self.config.anchor.0 * width as f32) as u32).min(width - 1);
        let anchor_y = ((self.config.anchor.1 * height as f32) as u32).min(height - 1);
        BoundingBox::around(
            (anchor_x, anchor_y),
            self.config.search_half_width,
            self.config.search_half_height,
            dimensions,
        )
    }

    fn mask_stats(pixels: &RgbImage, region: BoundingBox, range: &ColorRange) -> MaskStats {
        let mut stats = MaskStats {
            min: (u32::MAX, u32::MAX),
            ..Default::default()
        };
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let pixel = pixels.get_pixel(x, y);
                let value = luma(pixel) as f64;
                if range.contains(pixel) {
                    stats.count += 1;
                    stats.sum_x += x as f64;
                    stats.sum_y += y as f64;
                    stats.min = (stats.min.0.min(x), stats.min.1.min(y));
                    stats.max = (stats.max.0.max(x), stats.max.1.max(y));
                    stats.mask_luma += value;
                } else {
                    stats.other_count += 1;
                    stats.other_luma += value;
                }
            }
        }
        stats
    }

    fn match_range(&self, pixels: &RgbImage, region: BoundingBox, range: &ColorRange) -> Option<Point> {
        let stats = Self::mask_stats(pixels, region, range);
        if stats.count < self.config.min_area.max(1) || stats.count > self.config.max_area {
            return None;
        }

        let spread = (stats.max.0 - stats.min.0).max(stats.max.1 - stats.min.1) + 1;
        if spread > self.config.max_spread {
            return None;
        }

        let mask_mean = stats.mask_luma / stats.count as f64;
        let contrast = if stats.other_count == 0 {
            mask_mean
        } else {
            (mask_mean - stats.other_luma / stats.other_count as f64).abs()
        };
        if (contrast as f32) < self.config.min_contrast {
            return None;
        }

        Some(Point::new(
            (stats.sum_x / stats.count as f64) as f32,
            (stats.sum_y / stats.count as f64) as f32,
        ))
    }
}

impl FrameDetector for CrosshairDetector {
    type Output = Option<Point>;

    fn detect(&self, pixels: &RgbImage) -> Option<Point> {
        let dimensions = pixels.dimensions();
        if dimensions.0 == 0 || dimensions.1 == 0 {
            return None;
        }
        let region = self.search_region(dimensions);
        self.config
            .colors
            .iter()
            .find_map(|range| self.match_range(pixels, region, range))
    }

    fn name(&self) -> &'static str {
        "CrosshairDetector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::synthetic::SyntheticScene;
    use image::Rgb;
    use std::time::Duration;

    #[test]
    fn finds_reticle_centroid() {
        let frame = SyntheticScene::new(320, 240).render(Duration::ZERO, 0);
        let detector = CrosshairDetector::new(ReticleConfig::default());
        assert_eq!(detector.detect(frame.pixels()), Some(Point::new(160.0, 120.0)));
    }

    #[test]
    fn reticle_outside_search_region_is_absent() {
        let frame = SyntheticScene::new(320, 240)
            .with_crosshair(Some((20, 20)))
            .render(Duration::ZERO, 0);
        let detector = CrosshairDetector::new(ReticleConfig::default());
        assert_eq!(detector.detect(frame.pixels()), None);
    }

    #[test]
    fn oversized_match_is_ambiguous() {
        let pixels = RgbImage::from_pixel(64, 64, Rgb([20, 250, 20]));
        let detector = CrosshairDetector::new(ReticleConfig::default());
        assert_eq!(detector.detect(&pixels), None);
    }

    #[test]
    fn low_contrast_reticle_is_rejected() {
        let mut config = ReticleConfig::default();
        config.min_contrast = 200.0;
        let frame = SyntheticScene::new(320, 240).render(Duration::ZERO, 0);
        assert_eq!(CrosshairDetector::new(config).detect(frame.pixels()), None);
    }
}
