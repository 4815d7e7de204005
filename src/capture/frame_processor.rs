use super::crosshair::CrosshairDetector;
use super::detection::{DetectionResult, FrameDetector};
use super::indicator::FireIndicatorDetector;
use super::motion::{MotionEstimator, MotionReference};
use super::opponents::OpponentDetector;
use crate::common::{frame::Frame, geometry::MotionVector};
use crate::config::DetectionConfig;
use tracing::debug;

/// Per-frame feature extraction.
///
/// Output depends only on the frame and the motion reference left by the
/// previous call. The frame is consumed and dropped before `process` returns.
pub struct FrameProcessor {
    crosshair: CrosshairDetector,
    opponents: OpponentDetector,
    fire_indicator: FireIndicatorDetector,
    motion: MotionEstimator,
    reference: Option<MotionReference>,
}

impl FrameProcessor {
    pub fn new(config: &DetectionConfig) -> Self {
        let processor = Self {
            crosshair: CrosshairDetector::new(config.reticle.clone()),
            opponents: OpponentDetector::new(config.opponents.clone()),
            fire_indicator: FireIndicatorDetector::new(config.fire_indicator.clone()),
            motion: MotionEstimator::new(config.motion.clone()),
            reference: None,
        };
        debug!(
            "Frame processor ready: {}, {}, {}",
            processor.crosshair.name(),
            processor.opponents.name(),
            processor.fire_indicator.name()
        );
        processor
    }

    pub fn process(&mut self, frame: Frame) -> DetectionResult {
        let pixels = frame.pixels();
        let sequence = frame.sequence();
        let dimensions = frame.dimensions();

        let crosshair = self.crosshair.detect(pixels);
        let opponents = self.opponents.detect(pixels);
        let weapon_fired = self.fire_indicator.detect(pixels);

        let current = self.motion.reference(pixels, sequence);
        let (motion, motion_reset) = match self.reference.take() {
            None => (MotionVector::ZERO, false),
            Some(previous) if previous.continues_with(sequence, dimensions) => {
                (self.motion.estimate(&previous, &current), false)
            }
            Some(previous) => {
                debug!(
                    "Motion reference reset: frame {} does not follow frame {} ({:?} -> {:?})",
                    sequence, previous.sequence, previous.dimensions, dimensions
                );
                (MotionVector::ZERO, true)
            }
        };
        self.reference = Some(current);

        DetectionResult {
            sequence,
            timestamp: frame.timestamp(),
            frame_size: dimensions,
            crosshair,
            opponents,
            motion,
            motion_reset,
            weapon_fired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::{BoundingBox, Point};
    use crate::common::synthetic::SyntheticScene;
    use std::time::Duration;

    fn scene() -> SyntheticScene {
        SyntheticScene::new(320, 240)
    }

    #[test]
    fn first_frame_has_zero_motion() {
        let mut processor = FrameProcessor::new(&DetectionConfig::default());
        let result = processor.process(scene().with_camera((10, 0)).render(Duration::ZERO, 1));
        assert_eq!(result.motion, MotionVector::ZERO);
        assert!(!result.motion_reset);
        assert_eq!(result.crosshair, Some(Point::new(160.0, 120.0)));
    }

    #[test]
    fn extracts_all_features() {
        let mut processor = FrameProcessor::new(&DetectionConfig::default());
        let frame = scene()
            .with_opponent(BoundingBox::new(150, 100, 20, 40))
            .firing(true)
            .render(Duration::from_millis(33), 4);
        let result = processor.process(frame);
        assert_eq!(result.sequence, 4);
        assert_eq!(result.timestamp, Duration::from_millis(33));
        assert_eq!(result.frame_size, (320, 240));
        assert!(result.weapon_fired);
        assert_eq!(result.opponents.len(), 1);
        assert!(result.crosshair_on_target());
    }

    #[test]
    fn consecutive_frames_track_motion() {
        let mut processor = FrameProcessor::new(&DetectionConfig::default());
        processor.process(scene().render(Duration::ZERO, 1));
        let result = processor.process(scene().with_camera((4, 0)).render(Duration::from_millis(33), 2));
        assert_eq!(result.motion, MotionVector::new(-4.0, 0.0));
        assert!(!result.motion_reset);
    }

    #[test]
    fn sequence_gap_resets_motion() {
        let mut processor = FrameProcessor::new(&DetectionConfig::default());
        processor.process(scene().render(Duration::ZERO, 1));
        // a large pan across a gap must not produce a spurious vector
        let result = processor.process(scene().with_camera((40, 12)).render(Duration::from_millis(100), 4));
        assert_eq!(result.motion, MotionVector::ZERO);
        assert!(result.motion_reset);

        let result = processor.process(scene().with_camera((44, 12)).render(Duration::from_millis(133), 5));
        assert!(!result.motion_reset);
        assert_eq!(result.motion, MotionVector::new(-4.0, 0.0));
    }

    #[test]
    fn dimension_change_resets_motion() {
        let mut processor = FrameProcessor::new(&DetectionConfig::default());
        processor.process(scene().render(Duration::ZERO, 1));
        let result = processor.process(SyntheticScene::new(640, 480).render(Duration::from_millis(33), 2));
        assert!(result.motion_reset);
        assert_eq!(result.motion, MotionVector::ZERO);
    }
}
