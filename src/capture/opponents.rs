use super::detection::{FrameDetector, Opponent};
use crate::common::geometry::BoundingBox;
use crate::config::OpponentConfig;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;

const COMPACTNESS_WEIGHT: f32 = 0.6;
const PURITY_WEIGHT: f32 = 0.4;

/// Colour-signature segmentation into opponent bounding boxes.
pub struct OpponentDetector {
    config: OpponentConfig,
}

struct Component {
    bbox: BoundingBox,
    area: usize,
    purity: f32,
}

impl OpponentDetector {
    pub fn new(config: OpponentConfig) -> Self {
        Self { config }
    }

    /// Best purity over the signature ranges containing `pixel`.
    fn signature_purity(&self, pixel: &Rgb<u8>) -> Option<f32> {
        self.config
            .signature
            .iter()
            .filter(|range| range.contains(pixel))
            .map(|range| range.purity(pixel))
            .max_by(f32::total_cmp)
    }

    fn components(&self, pixels: &RgbImage) -> Vec<Component> {
        let (width, height) = pixels.dimensions();
        let index = |x: u32, y: u32| y as usize * width as usize + x as usize;

        let purity: Vec<Option<f32>> = pixels.pixels().map(|p| self.signature_purity(p)).collect();
        let mut visited = vec![false; purity.len()];
        let mut queue = VecDeque::new();
        let mut components = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let start = index(x, y);
                if visited[start] || purity[start].is_none() {
                    continue;
                }
                visited[start] = true;
                queue.push_back((x, y));

                let mut area = 0usize;
                let mut purity_sum = 0.0f32;
                let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);

                while let Some((cx, cy)) = queue.pop_front() {
                    area += 1;
                    purity_sum += purity[index(cx, cy)].unwrap_or(0.0);
                    min_x = min_x.min(cx);
                    min_y = min_y.min(cy);
                    max_x = max_x.max(cx);
                    max_y = max_y.max(cy);

                    let neighbours = [
                        (cx.checked_sub(1), Some(cy)),
                        ((cx + 1 < width).then_some(cx + 1), Some(cy)),
                        (Some(cx), cy.checked_sub(1)),
                        (Some(cx), (cy + 1 < height).then_some(cy + 1)),
                    ];
                    for (nx, ny) in neighbours {
                        let (Some(nx), Some(ny)) = (nx, ny) else {
                            continue;
                        };
                        let n = index(nx, ny);
                        if !visited[n] && purity[n].is_some() {
                            visited[n] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }

                components.push(Component {
                    bbox: BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
                    area,
                    purity: purity_sum / area as f32,
                });
            }
        }

        components
    }
}

impl FrameDetector for OpponentDetector {
    type Output = Vec<Opponent>;

    fn detect(&self, pixels: &RgbImage) -> Vec<Opponent> {
        let mut candidates: Vec<(usize, Opponent)> = self
            .components(pixels)
            .into_iter()
            .filter(|component| component.area >= self.config.min_area)
            .filter_map(|component| {
                let compactness = component.area as f32 / component.bbox.area().max(1) as f32;
                let confidence =
                    (COMPACTNESS_WEIGHT * compactness + PURITY_WEIGHT * component.purity).clamp(0.0, 1.0);
                (confidence >= self.config.min_confidence).then_some((
                    component.area,
                    Opponent {
                        bbox: component.bbox,
                        confidence,
                    },
                ))
            })
            .collect();

        candidates.sort_by(|(area_a, a), (area_b, b)| {
            area_b
                .cmp(area_a)
                .then(a.bbox.y.cmp(&b.bbox.y))
                .then(a.bbox.x.cmp(&b.bbox.x))
        });
        candidates.truncate(self.config.max_opponents);
        candidates.into_iter().map(|(_, opponent)| opponent).collect()
    }

    fn name(&self) -> &'static str {
        "OpponentDetector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::synthetic::SyntheticScene;
    use std::time::Duration;

    #[test]
    fn segments_opponent_box() {
        let frame = SyntheticScene::new(640, 480)
            .with_crosshair(None)
            .with_opponent(BoundingBox::new(300, 200, 40, 100))
            .render(Duration::ZERO, 0);
        let opponents = OpponentDetector::new(OpponentConfig::default()).detect(frame.pixels());
        assert_eq!(opponents.len(), 1);
        assert_eq!(opponents[0].bbox, BoundingBox::new(300, 200, 40, 100));
        assert!(opponents[0].confidence > 0.8);
    }

    #[test]
    fn filters_small_regions() {
        let frame = SyntheticScene::new(200, 200)
            .with_crosshair(None)
            .with_opponent(BoundingBox::new(10, 10, 5, 5))
            .with_opponent(BoundingBox::new(100, 100, 20, 20))
            .render(Duration::ZERO, 0);
        let opponents = OpponentDetector::new(OpponentConfig::default()).detect(frame.pixels());
        assert_eq!(opponents.len(), 1);
        assert_eq!(opponents[0].bbox, BoundingBox::new(100, 100, 20, 20));
    }

    #[test]
    fn keeps_largest_when_capped() {
        let config = OpponentConfig {
            max_opponents: 2,
            ..OpponentConfig::default()
        };
        let frame = SyntheticScene::new(300, 100)
            .with_crosshair(None)
            .with_opponent(BoundingBox::new(10, 10, 12, 12))
            .with_opponent(BoundingBox::new(100, 10, 20, 20))
            .with_opponent(BoundingBox::new(200, 10, 15, 15))
            .render(Duration::ZERO, 0);
        let opponents = OpponentDetector::new(config).detect(frame.pixels());
        let boxes: Vec<_> = opponents.iter().map(|o| o.bbox.x).collect();
        assert_eq!(boxes, vec![100, 200]);
    }

    #[test]
    fn sparse_speckle_has_low_confidence() {
        let mut pixels = RgbImage::from_pixel(50, 50, Rgb([60, 60, 60]));
        // a one-pixel-wide diagonal staircase: large box, tiny fill
        for i in 0..40 {
            pixels.put_pixel(i, i, Rgb([180, 80, 80]));
            pixels.put_pixel(i + 1, i, Rgb([180, 80, 80]));
            pixels.put_pixel(i + 2, i, Rgb([180, 80, 80]));
        }
        let opponents = OpponentDetector::new(OpponentConfig::default()).detect(&pixels);
        assert!(opponents.is_empty());
    }
}
