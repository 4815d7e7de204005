use super::tip_generator::{Tip, TipGenerator};
use super::tip_rule::{MetricView, TipRule};
use super::training_plan::TrainingPlan;
use crate::analysis::behavior::BehaviorSummary;
use crate::analysis::{
    BehaviorAnalyzer, BehaviorEvent, GameAnalyzer, PerformanceSnapshot, SkillAssessor, SkillLevel, SkillScores,
};
use crate::capture::FrameProcessor;
use crate::common::frame::Frame;
use crate::config::Configuration;
use crate::error::ConfigError;
use crate::pipeline::metrics::{FrameMetrics, PerformanceMonitor, PipelineStage, PipelineStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use uuid::Uuid;

/// What external readers see after each pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingUpdate {
    pub session_id: Uuid,
    pub sequence: u64,
    pub timestamp: Duration,
    pub snapshot: PerformanceSnapshot,
    pub scores: SkillScores,
    pub level: SkillLevel,
    pub events: Vec<BehaviorEvent>,
    pub tip: Option<Tip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Duplicate,
    OutOfOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Stopped,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Capture time covered by the processed frames.
    pub duration: Duration,
    pub end_reason: EndReason,
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub motion_resets: u64,
    pub scores: SkillScores,
    pub skill_level: SkillLevel,
    pub behavior_log: Vec<BehaviorEvent>,
    pub behavior_summary: BehaviorSummary,
    pub tip_history: Vec<Tip>,
    pub training_plan: TrainingPlan,
    pub pipeline: PipelineStats,
}

/// Verdict on an incoming frame before any work is done on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    Reject(RejectReason),
    /// The session's capture-time budget is spent.
    Expire,
}

/// All state of one coaching session.
pub struct Session {
    id: Uuid,
    config: Arc<Configuration>,
    started_at: DateTime<Utc>,
    frame_processor: FrameProcessor,
    game_analyzer: GameAnalyzer,
    behavior_analyzer: BehaviorAnalyzer,
    skill_assessor: SkillAssessor,
    tip_generator: TipGenerator,
    monitor: PerformanceMonitor,
    first_timestamp: Option<Duration>,
    last_timestamp: Option<Duration>,
    last_sequence: Option<u64>,
    frames_processed: u64,
    frames_rejected: u64,
    motion_resets: u64,
}

impl Session {
    pub fn new(config: Arc<Configuration>, rules: Vec<TipRule>) -> Result<Self, ConfigError> {
        let tip_generator = TipGenerator::new(rules, config.coaching.max_tips_per_session)?;
        Ok(Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            frame_processor: FrameProcessor::new(&config.detection),
            game_analyzer: GameAnalyzer::new(config.analysis.clone()),
            behavior_analyzer: BehaviorAnalyzer::new(&config.behavior, &config.analysis),
            skill_assessor: SkillAssessor::new(config.skill.clone()),
            tip_generator,
            monitor: PerformanceMonitor::new(config.capture.frame_budget()),
            first_timestamp: None,
            last_timestamp: None,
            last_sequence: None,
            frames_processed: 0,
            frames_rejected: 0,
            motion_resets: 0,
            config,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn admit(&mut self, frame: &Frame) -> Admission {
        let sequence = frame.sequence();
        if let Some(last) = self.last_sequence {
            if sequence <= last {
                self.frames_rejected += 1;
                let reason = if sequence == last {
                    RejectReason::Duplicate
                } else {
                    RejectReason::OutOfOrder
                };
                debug!("Rejecting frame {} after {}: {:?}", sequence, last, reason);
                return Admission::Reject(reason);
            }
        }
        if let Some(first) = self.first_timestamp {
            if frame.timestamp().saturating_sub(first) >= self.config.session.max_duration() {
                return Admission::Expire;
            }
        }
        Admission::Accept
    }

    /// One full pass: detection, aggregation and behaviour (same detection),
    /// skill update, tip selection.
    #[instrument(skip_all, fields(session = %self.id, sequence = frame.sequence()))]
    pub fn run_pass(&mut self, frame: Frame) -> CoachingUpdate {
        let start = Instant::now();
        let sequence = frame.sequence();
        let timestamp = frame.timestamp();
        let mut metrics = FrameMetrics::new(sequence);

        self.first_timestamp.get_or_insert(timestamp);
        self.last_timestamp = Some(timestamp);
        self.last_sequence = Some(sequence);

        let detection = Arc::new(metrics.time(PipelineStage::Detection, || {
            self.frame_processor.process(frame)
        }));
        if detection.motion_reset {
            self.motion_resets += 1;
        }

        let snapshot = metrics.time(PipelineStage::Aggregation, || {
            self.game_analyzer.ingest(Arc::clone(&detection))
        });
        let events = metrics.time(PipelineStage::Behavior, || {
            self.behavior_analyzer.observe(&detection)
        });
        let scores = metrics.time(PipelineStage::Skill, || {
            self.skill_assessor.update(&snapshot, &events)
        });
        let tip = metrics.time(PipelineStage::Coaching, || {
            let view = MetricView {
                snapshot: &snapshot,
                scores: &scores,
                events: &events,
            };
            self.tip_generator.evaluate(&view, timestamp)
        });

        metrics.finalize(start);
        self.monitor.on_frame_processed(&metrics);
        self.frames_processed += 1;

        CoachingUpdate {
            session_id: self.id,
            sequence,
            timestamp,
            snapshot,
            scores,
            level: self.skill_assessor.level(),
            events,
            tip,
        }
    }

    /// Flush everything the session accumulated into its final report.
    pub fn into_report(self, end_reason: EndReason) -> SessionReport {
        let scores = self.skill_assessor.scores();
        let duration = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => Duration::ZERO,
        };
        SessionReport {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration,
            end_reason,
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
            motion_resets: self.motion_resets,
            scores,
            skill_level: self.skill_assessor.level(),
            behavior_log: self.behavior_analyzer.log().events(),
            behavior_summary: self.behavior_analyzer.log().summary(),
            tip_history: self.tip_generator.state().history().to_vec(),
            training_plan: TrainingPlan::build(&scores, self.skill_assessor.config()),
            pipeline: self.monitor.stats(),
        }
    }
}
