use crate::analysis::skill_assessor::SkillCategory;
use crate::capture::DetectionResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    CounterStrafe,
    PeekAndHold,
    OverExtension,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 3] = [
        BehaviorKind::CounterStrafe,
        BehaviorKind::PeekAndHold,
        BehaviorKind::OverExtension,
    ];

    /// Skill category a recognized instance of this pattern reflects on.
    pub fn category(&self) -> SkillCategory {
        match self {
            BehaviorKind::CounterStrafe => SkillCategory::Mechanics,
            BehaviorKind::PeekAndHold => SkillCategory::Positioning,
            BehaviorKind::OverExtension => SkillCategory::GameSense,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::CounterStrafe => "counter_strafe",
            BehaviorKind::PeekAndHold => "peek_and_hold",
            BehaviorKind::OverExtension => "over_extension",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Confirmed,
    Violated,
}

/// A recognized pattern instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub kind: BehaviorKind,
    pub outcome: Outcome,
    pub started_at: Duration,
    pub ended_at: Duration,
    pub start_sequence: u64,
    pub end_sequence: u64,
    pub confidence: f32,
}

impl BehaviorEvent {
    pub fn is_violation(&self) -> bool {
        self.outcome == Outcome::Violated
    }
}

/// The slice of a detection the recognizers transition on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorSignal {
    pub sequence: u64,
    pub timestamp: Duration,
    pub speed: f32,
    pub moving: bool,
    pub fired: bool,
    pub opponents_visible: usize,
    pub motion_reset: bool,
}

impl BehaviorSignal {
    pub fn from_detection(detection: &DetectionResult, moving_threshold: f32) -> Self {
        let speed = detection.motion.magnitude();
        Self {
            sequence: detection.sequence,
            timestamp: detection.timestamp,
            speed,
            moving: speed >= moving_threshold,
            fired: detection.weapon_fired,
            opponents_visible: detection.opponents.len(),
            motion_reset: detection.motion_reset,
        }
    }
}

/// Where a pattern instance began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub sequence: u64,
    pub timestamp: Duration,
}

impl Mark {
    pub fn at(signal: &BehaviorSignal) -> Self {
        Self {
            sequence: signal.sequence,
            timestamp: signal.timestamp,
        }
    }

    pub fn close(
        &self,
        kind: BehaviorKind,
        outcome: Outcome,
        signal: &BehaviorSignal,
        confidence: f32,
    ) -> BehaviorEvent {
        BehaviorEvent {
            kind,
            outcome,
            started_at: self.timestamp,
            ended_at: signal.timestamp,
            start_sequence: self.sequence,
            end_sequence: signal.sequence,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Finite-state recognizer for one behaviour pattern.
///
/// Reaching a terminal state yields one event and returns the recognizer to idle.
/// Ambiguous input yields nothing.
pub trait PatternRecognizer: Send {
    fn kind(&self) -> BehaviorKind;

    fn observe(&mut self, signal: &BehaviorSignal) -> Option<BehaviorEvent>;

    fn reset(&mut self);

    fn state_name(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn signal(sequence: u64, speed: f32, fired: bool, opponents_visible: usize) -> BehaviorSignal {
        BehaviorSignal {
            sequence,
            timestamp: Duration::from_millis(sequence * 33),
            speed,
            moving: speed >= 1.5,
            fired,
            opponents_visible,
            motion_reset: false,
        }
    }

    pub fn feed(
        recognizer: &mut dyn PatternRecognizer,
        signals: &[BehaviorSignal],
    ) -> Vec<BehaviorEvent> {
        signals.iter().filter_map(|s| recognizer.observe(s)).collect()
    }
}
