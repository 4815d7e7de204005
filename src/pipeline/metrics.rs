use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const ALPHA: f32 = 0.1; // EWMA smoothing factor

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Detection,
    Aggregation,
    Behavior,
    Skill,
    Coaching,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Detection,
        PipelineStage::Aggregation,
        PipelineStage::Behavior,
        PipelineStage::Skill,
        PipelineStage::Coaching,
    ];
}

/// Timings collected during one pipeline pass
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    pub sequence: u64,
    pub stage_durations_us: IndexMap<PipelineStage, u64>,
    pub total_processing_duration_us: u64,
}

impl FrameMetrics {
    pub fn new(sequence: u64) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    pub fn record_duration(&mut self, stage: PipelineStage, duration_us: u64) {
        *self.stage_durations_us.entry(stage).or_insert(0) += duration_us;
    }

    /// Time `f` as `stage`.
    pub fn time<T>(&mut self, stage: PipelineStage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let output = f();
        self.record_duration(stage, start.elapsed().as_micros() as u64);
        output
    }

    pub fn finalize(&mut self, start: Instant) {
        self.total_processing_duration_us = start.elapsed().as_micros() as u64;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub average_us: f32,
    pub max_us: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub average_frame_time_us: f32,
    pub max_frame_time_us: u64,
    /// Passes that took longer than one frame interval at the target rate.
    pub deadline_overruns: u64,
    pub stages: IndexMap<PipelineStage, StageTiming>,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self {
            frames_processed: 0,
            average_frame_time_us: 0.0,
            max_frame_time_us: 0,
            deadline_overruns: 0,
            stages: PipelineStage::ALL
                .into_iter()
                .map(|stage| (stage, StageTiming::default()))
                .collect(),
        }
    }
}

/// EWMA and max timings per stage, plus deadline overruns.
pub struct PerformanceMonitor {
    stats: PipelineStats,
    deadline_us: u64,
}

impl PerformanceMonitor {
    pub fn new(frame_budget: Duration) -> Self {
        Self {
            stats: PipelineStats::default(),
            deadline_us: frame_budget.as_micros() as u64,
        }
    }

    fn update_ewma(current: f32, new_value: u64, first: bool) -> f32 {
        if first {
            new_value as f32
        } else {
            current * (1.0 - ALPHA) + new_value as f32 * ALPHA
        }
    }

    pub fn on_frame_processed(&mut self, metrics: &FrameMetrics) {
        let first = self.stats.frames_processed == 0;
        self.stats.frames_processed += 1;

        let total = metrics.total_processing_duration_us;
        self.stats.average_frame_time_us =
            Self::update_ewma(self.stats.average_frame_time_us, total, first);
        self.stats.max_frame_time_us = self.stats.max_frame_time_us.max(total);

        for (stage, duration_us) in &metrics.stage_durations_us {
            let timing = self.stats.stages.entry(*stage).or_default();
            timing.average_us = Self::update_ewma(timing.average_us, *duration_us, first);
            timing.max_us = timing.max_us.max(*duration_us);
        }

        if total > self.deadline_us {
            self.stats.deadline_overruns += 1;
            let slowest = metrics
                .stage_durations_us
                .iter()
                .max_by_key(|(_, us)| **us)
                .map(|(stage, us)| format!("{stage:?}={us}us"))
                .unwrap_or_default();
            warn!(
                "Frame {} took {}us, over the {}us budget (slowest stage {})",
                metrics.sequence, total, self.deadline_us, slowest
            );
        } else {
            debug!(
                "PerformanceMonitor: processed frame {}, total_time={}us",
                metrics.sequence, total
            );
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.clone()
    }
}
