use crate::common::geometry::{BoundingBox, MotionVector, Point};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single-purpose feature extractor run against one frame's pixels.
pub trait FrameDetector: Send + Sync {
    type Output;

    fn detect(&self, pixels: &RgbImage) -> Self::Output;

    fn name(&self) -> &'static str;
}

/// An opponent candidate found by colour segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub bbox: BoundingBox,
    /// Blend of region compactness and colour purity, in [0, 1].
    pub confidence: f32,
}

/// Features extracted from exactly one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub sequence: u64,
    pub timestamp: Duration,
    pub frame_size: (u32, u32),
    pub crosshair: Option<Point>,
    pub opponents: Vec<Opponent>,
    pub motion: MotionVector,
    /// Motion continuity was lost before this frame (sequence gap or size change).
    pub motion_reset: bool,
    pub weapon_fired: bool,
}

impl DetectionResult {
    /// Opponent whose box centre is closest to `point`.
    pub fn nearest_opponent(&self, point: Point) -> Option<&Opponent> {
        self.opponents.iter().min_by(|a, b| {
            a.bbox
                .center()
                .distance_to(point)
                .total_cmp(&b.bbox.center().distance_to(point))
        })
    }

    /// True when the crosshair sits inside any opponent box.
    pub fn crosshair_on_target(&self) -> bool {
        self.crosshair
            .map(|crosshair| self.opponents.iter().any(|o| o.bbox.contains_point(crosshair)))
            .unwrap_or(false)
    }

    /// Point the player is aiming at: the crosshair, or the frame centre when it was not found.
    pub fn aim_point(&self) -> Point {
        self.crosshair.unwrap_or_else(|| {
            Point::new(self.frame_size.0 as f32 / 2.0, self.frame_size.1 as f32 / 2.0)
        })
    }
}

/// ITU-R BT.601 luma.
pub fn luma(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(crosshair: Option<Point>, opponents: Vec<Opponent>) -> DetectionResult {
        DetectionResult {
            sequence: 1,
            timestamp: Duration::ZERO,
            frame_size: (640, 480),
            crosshair,
            opponents,
            motion: MotionVector::ZERO,
            motion_reset: false,
            weapon_fired: true,
        }
    }

    #[test]
    fn nearest_opponent_by_center_distance() {
        let far = Opponent {
            bbox: BoundingBox::new(500, 100, 20, 40),
            confidence: 0.9,
        };
        let near = Opponent {
            bbox: BoundingBox::new(300, 200, 40, 100),
            confidence: 0.5,
        };
        let result = detection(Some(Point::new(320.0, 210.0)), vec![far, near]);
        assert_eq!(result.nearest_opponent(Point::new(320.0, 210.0)), Some(&near));
        assert!(result.crosshair_on_target());
    }

    #[test]
    fn missing_crosshair_is_never_on_target() {
        let result = detection(
            None,
            vec![Opponent {
                bbox: BoundingBox::new(0, 0, 640, 480),
                confidence: 1.0,
            }],
        );
        assert!(!result.crosshair_on_target());
        assert_eq!(result.aim_point(), Point::new(320.0, 240.0));
    }
}
