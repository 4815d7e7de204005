use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Windowed component scores, every field in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Hits over shots; absent when nothing was fired in the window.
    pub accuracy: Option<f32>,
    pub crosshair_placement: f32,
    pub crosshair_stability: f32,
    pub movement_efficiency: f32,
    pub threat_level: f32,
    /// Share of opponent-visible frames with the crosshair near an opponent;
    /// absent when no opponent was seen.
    pub target_awareness: Option<f32>,
}

impl PerformanceMetrics {
    pub fn components(&self) -> impl Iterator<Item = f32> {
        [
            self.accuracy,
            Some(self.crosshair_placement),
            Some(self.crosshair_stability),
            Some(self.movement_efficiency),
            Some(self.threat_level),
            self.target_awareness,
        ]
        .into_iter()
        .flatten()
    }
}

/// Aggregate over the most recent detection window. Replaced wholesale every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub first_sequence: u64,
    pub last_sequence: u64,
    pub started_at: Duration,
    pub ended_at: Duration,
    /// Frames in the window.
    pub frames: usize,
    /// Frames in the window with a located crosshair.
    pub samples: usize,
    /// `None` while the window holds too few samples.
    pub metrics: Option<PerformanceMetrics>,
}

impl PerformanceSnapshot {
    /// Low-confidence snapshots are not authoritative and must not feed skill smoothing.
    pub fn is_low_confidence(&self) -> bool {
        self.metrics.is_none()
    }

    pub fn accuracy(&self) -> Option<f32> {
        self.metrics.and_then(|m| m.accuracy)
    }

    pub fn crosshair_placement(&self) -> Option<f32> {
        self.metrics.map(|m| m.crosshair_placement)
    }

    pub fn crosshair_stability(&self) -> Option<f32> {
        self.metrics.map(|m| m.crosshair_stability)
    }

    pub fn movement_efficiency(&self) -> Option<f32> {
        self.metrics.map(|m| m.movement_efficiency)
    }

    pub fn threat_level(&self) -> Option<f32> {
        self.metrics.map(|m| m.threat_level)
    }

    pub fn target_awareness(&self) -> Option<f32> {
        self.metrics.and_then(|m| m.target_awareness)
    }
}
