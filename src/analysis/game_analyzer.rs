use super::snapshot::{PerformanceMetrics, PerformanceSnapshot};
use crate::capture::DetectionResult;
use crate::common::geometry::distance_outside;
use crate::common::ring_buffer::RingBuffer;
use crate::config::AnalysisConfig;
use std::sync::Arc;

/// Sliding-window aggregator turning detections into performance snapshots.
pub struct GameAnalyzer {
    config: AnalysisConfig,
    window: RingBuffer<Arc<DetectionResult>>,
}

impl GameAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let window = RingBuffer::new(config.window_size);
        Self { config, window }
    }

    pub fn ingest(&mut self, detection: Arc<DetectionResult>) -> PerformanceSnapshot {
        self.window.push(detection);
        self.snapshot()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    fn snapshot(&self) -> PerformanceSnapshot {
        let (first_sequence, started_at) = self
            .window
            .front()
            .map(|d| (d.sequence, d.timestamp))
            .unwrap_or_default();
        let (last_sequence, ended_at) = self
            .window
            .back()
            .map(|d| (d.sequence, d.timestamp))
            .unwrap_or_default();
        let samples = self.window.iter().filter(|d| d.crosshair.is_some()).count();

        let metrics = (samples >= self.config.min_samples.max(1)).then(|| PerformanceMetrics {
            accuracy: self.accuracy(),
            crosshair_placement: self.crosshair_placement(),
            crosshair_stability: self.crosshair_stability(),
            movement_efficiency: self.movement_efficiency(),
            threat_level: self.threat_level(),
            target_awareness: self.target_awareness(),
        });

        PerformanceSnapshot {
            first_sequence,
            last_sequence,
            started_at,
            ended_at,
            frames: self.window.len(),
            samples,
            metrics,
        }
    }

    fn accuracy(&self) -> Option<f32> {
        let (shots, hits) = self
            .window
            .iter()
            .filter(|d| d.weapon_fired && d.crosshair.is_some())
            .fold((0usize, 0usize), |(shots, hits), d| {
                (shots + 1, hits + d.crosshair_on_target() as usize)
            });
        (shots > 0).then(|| hits as f32 / shots as f32)
    }

    fn crosshair_placement(&self) -> f32 {
        let tolerance = self.config.placement_tolerance_px;
        let penalties: Vec<f32> = self
            .window
            .iter()
            .filter_map(|d| {
                let crosshair = d.crosshair?;
                let band = match d.nearest_opponent(crosshair) {
                    Some(opponent) => opponent.bbox.head_band(self.config.head_fraction),
                    None => {
                        let line = self.config.default_head_line * d.frame_size.1 as f32;
                        let half = self.config.default_band_half_height;
                        (line - half, line + half)
                    }
                };
                let deviation = distance_outside(crosshair.y, band);
                Some((deviation / tolerance).powi(2).min(1.0))
            })
            .collect();
        1.0 - mean(&penalties).unwrap_or(0.0)
    }

    fn crosshair_stability(&self) -> f32 {
        let detections: Vec<_> = self.window.iter().collect();
        let steps: Vec<f32> = detections
            .windows(2)
            .filter_map(|pair| {
                let from = pair[0].crosshair?;
                let to = pair[1].crosshair?;
                Some((from.distance_to(to) / self.config.jitter_scale_px).min(1.0))
            })
            .collect();
        1.0 - mean(&steps).unwrap_or(0.0)
    }

    fn movement_efficiency(&self) -> f32 {
        let shot_penalties: Vec<f32> = self
            .window
            .iter()
            .filter(|d| d.weapon_fired)
            .map(|d| (d.motion.magnitude() / self.config.strafe_tolerance_px).min(1.0))
            .collect();
        let fire_penalty = mean(&shot_penalties).unwrap_or(0.0);

        let directions: Vec<(f32, f32)> = self
            .window
            .iter()
            .filter(|d| d.motion.magnitude() >= self.config.moving_threshold_px)
            .filter_map(|d| d.motion.direction())
            .collect();
        // circular variance of the movement direction
        let erratic = if directions.len() < 2 {
            0.0
        } else {
            let n = directions.len() as f32;
            let (sx, sy) = directions
                .iter()
                .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
            1.0 - ((sx / n).powi(2) + (sy / n).powi(2)).sqrt()
        };

        let weight = self.config.fire_penalty_weight;
        (1.0 - weight * fire_penalty - (1.0 - weight) * erratic).clamp(0.0, 1.0)
    }

    fn threat_level(&self) -> f32 {
        let per_frame: Vec<f32> = self
            .window
            .iter()
            .map(|d| {
                let aim = d.aim_point();
                let proximity: f32 = d
                    .opponents
                    .iter()
                    .map(|o| 1.0 - (o.bbox.center().distance_to(aim) / self.config.threat_radius_px).min(1.0))
                    .sum();
                (proximity / self.config.threat_saturation).min(1.0)
            })
            .collect();
        mean(&per_frame).unwrap_or(0.0)
    }

    fn target_awareness(&self) -> Option<f32> {
        let tracked: Vec<f32> = self
            .window
            .iter()
            .filter_map(|d| {
                let crosshair = d.crosshair?;
                let nearest = d.nearest_opponent(crosshair)?;
                let near = nearest.bbox.center().distance_to(crosshair) <= self.config.awareness_radius_px;
                Some(if near { 1.0 } else { 0.0 })
            })
            .collect();
        mean(&tracked)
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    (!values.is_empty()).then(|| values.iter().sum::<f32>() / values.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Opponent;
    use crate::common::geometry::{BoundingBox, MotionVector, Point};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::time::Duration;

    fn detection(sequence: u64) -> DetectionResult {
        DetectionResult {
            sequence,
            timestamp: Duration::from_millis(sequence * 33),
            frame_size: (640, 480),
            crosshair: Some(Point::new(320.0, 240.0)),
            opponents: Vec::new(),
            motion: MotionVector::ZERO,
            motion_reset: false,
            weapon_fired: false,
        }
    }

    fn config(window_size: usize, min_samples: usize) -> AnalysisConfig {
        AnalysisConfig {
            window_size,
            min_samples,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn low_confidence_until_min_samples() {
        let mut analyzer = GameAnalyzer::new(config(30, 10));
        for sequence in 1..10 {
            assert!(analyzer.ingest(Arc::new(detection(sequence))).is_low_confidence());
        }
        let snapshot = analyzer.ingest(Arc::new(detection(10)));
        assert!(!snapshot.is_low_confidence());
        assert_eq!(snapshot.samples, 10);
        assert_eq!((snapshot.first_sequence, snapshot.last_sequence), (1, 10));
    }

    #[test]
    fn frames_without_crosshair_are_not_samples() {
        let mut analyzer = GameAnalyzer::new(config(5, 3));
        for sequence in 1..=5 {
            let mut d = detection(sequence);
            if sequence % 2 == 0 {
                d.crosshair = None;
            }
            analyzer.ingest(Arc::new(d));
        }
        let snapshot = analyzer.ingest(Arc::new(DetectionResult {
            crosshair: None,
            ..detection(6)
        }));
        assert_eq!(snapshot.frames, 5);
        assert_eq!(snapshot.samples, 2);
        assert!(snapshot.is_low_confidence());
    }

    #[test]
    fn accuracy_counts_hits_over_shots() {
        let mut analyzer = GameAnalyzer::new(config(10, 1));
        let target = Opponent {
            bbox: BoundingBox::new(300, 200, 40, 100),
            confidence: 0.9,
        };
        let mut snapshot = None;
        for sequence in 1..=4 {
            let mut d = detection(sequence);
            d.weapon_fired = true;
            d.opponents = vec![target];
            // two of four shots leave the box
            if sequence > 2 {
                d.crosshair = Some(Point::new(100.0, 240.0));
            }
            snapshot = Some(analyzer.ingest(Arc::new(d)));
        }
        assert_eq!(snapshot.and_then(|s| s.accuracy()), Some(0.5));
    }

    #[test]
    fn no_shots_means_no_accuracy() {
        let mut analyzer = GameAnalyzer::new(config(10, 1));
        let snapshot = analyzer.ingest(Arc::new(detection(1)));
        assert_eq!(snapshot.accuracy(), None);
        assert_eq!(snapshot.target_awareness(), None);
    }

    #[test]
    fn placement_falls_off_quadratically() {
        let mut near = GameAnalyzer::new(config(1, 1));
        let mut far = GameAnalyzer::new(config(1, 1));
        // default band is 230..250 on a 480px frame
        let near_score = near
            .ingest(Arc::new(DetectionResult {
                crosshair: Some(Point::new(320.0, 300.0)),
                ..detection(1)
            }))
            .crosshair_placement()
            .unwrap();
        let far_score = far
            .ingest(Arc::new(DetectionResult {
                crosshair: Some(Point::new(320.0, 450.0)),
                ..detection(1)
            }))
            .crosshair_placement()
            .unwrap();
        assert!((near_score - 0.75).abs() < 1e-6);
        assert_eq!(far_score, 0.0);
    }

    #[test]
    fn placement_uses_nearest_opponent_head() {
        let mut analyzer = GameAnalyzer::new(config(1, 1));
        let snapshot = analyzer.ingest(Arc::new(DetectionResult {
            crosshair: Some(Point::new(320.0, 210.0)),
            opponents: vec![Opponent {
                bbox: BoundingBox::new(300, 200, 40, 100),
                confidence: 0.9,
            }],
            ..detection(1)
        }));
        assert_eq!(snapshot.crosshair_placement(), Some(1.0));
        assert_eq!(snapshot.target_awareness(), Some(1.0));
    }

    #[test]
    fn shooting_while_moving_hurts_efficiency() {
        let mut still = GameAnalyzer::new(config(4, 1));
        let mut strafing = GameAnalyzer::new(config(4, 1));
        let mut still_score = 0.0;
        let mut strafing_score = 0.0;
        for sequence in 1..=4 {
            let d = DetectionResult {
                weapon_fired: true,
                ..detection(sequence)
            };
            still_score = still.ingest(Arc::new(d.clone())).movement_efficiency().unwrap();
            strafing_score = strafing
                .ingest(Arc::new(DetectionResult {
                    motion: MotionVector::new(12.0, 0.0),
                    ..d
                }))
                .movement_efficiency()
                .unwrap();
        }
        assert_eq!(still_score, 1.0);
        assert!((strafing_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn erratic_direction_hurts_efficiency() {
        let mut analyzer = GameAnalyzer::new(config(4, 1));
        let mut snapshot = None;
        for (sequence, dx) in [(1, 5.0), (2, -5.0), (3, 5.0), (4, -5.0)] {
            snapshot = Some(analyzer.ingest(Arc::new(DetectionResult {
                motion: MotionVector::new(dx, 0.0),
                ..detection(sequence)
            })));
        }
        // opposite directions cancel: full circular variance
        let efficiency = snapshot.and_then(|s| s.movement_efficiency()).unwrap();
        assert!((efficiency - 0.6).abs() < 1e-6);
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut analyzer = GameAnalyzer::new(config(30, 10));
        for sequence in 1..=500 {
            analyzer.ingest(Arc::new(detection(sequence)));
            assert!(analyzer.window_len() <= 30);
        }
        assert_eq!(analyzer.window_capacity(), 30);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut analyzer = GameAnalyzer::new(config(30, 5));
        for sequence in 1..=1_000 {
            let opponents = (0..rng.random_range(0..4))
                .map(|_| Opponent {
                    bbox: BoundingBox::new(
                        rng.random_range(0..600),
                        rng.random_range(0..400),
                        rng.random_range(1..80),
                        rng.random_range(1..160),
                    ),
                    confidence: rng.random_range(0.3..1.0),
                })
                .collect();
            let d = DetectionResult {
                crosshair: rng
                    .random_bool(0.8)
                    .then(|| Point::new(rng.random_range(0.0..640.0), rng.random_range(0.0..480.0))),
                opponents,
                motion: MotionVector::new(rng.random_range(-40.0..40.0), rng.random_range(-40.0..40.0)),
                weapon_fired: rng.random_bool(0.3),
                ..detection(sequence)
            };
            let snapshot = analyzer.ingest(Arc::new(d));
            if let Some(metrics) = snapshot.metrics {
                assert!(metrics.components().all(|v| (0.0..=1.0).contains(&v)), "{metrics:?}");
            }
        }
    }
}
