pub mod counter_strafe;
pub mod event;
pub mod log;
pub mod over_extension;
pub mod peek_and_hold;

pub use counter_strafe::CounterStrafeRecognizer;
pub use event::{BehaviorEvent, BehaviorKind, BehaviorSignal, Outcome, PatternRecognizer};
pub use log::{BehaviorLog, BehaviorSummary, OutcomeTally};
pub use over_extension::OverExtensionRecognizer;
pub use peek_and_hold::PeekAndHoldRecognizer;

use crate::capture::DetectionResult;
use crate::config::{AnalysisConfig, BehaviorConfig};
use tracing::debug;

/// Runs every pattern recognizer over the detection stream and keeps the event log.
///
/// Recognizers hold only their own state; a motion reset returns all of them to idle.
pub struct BehaviorAnalyzer {
    recognizers: Vec<Box<dyn PatternRecognizer>>,
    moving_threshold: f32,
    log: BehaviorLog,
}

impl BehaviorAnalyzer {
    pub fn new(behavior: &BehaviorConfig, analysis: &AnalysisConfig) -> Self {
        let recognizers: Vec<Box<dyn PatternRecognizer>> = vec![
            Box::new(CounterStrafeRecognizer::new(behavior)),
            Box::new(PeekAndHoldRecognizer::new(behavior, analysis.moving_threshold_px)),
            Box::new(OverExtensionRecognizer::new(behavior)),
        ];
        Self::with_recognizers(recognizers, behavior, analysis)
    }

    pub fn with_recognizers(
        recognizers: Vec<Box<dyn PatternRecognizer>>,
        behavior: &BehaviorConfig,
        analysis: &AnalysisConfig,
    ) -> Self {
        Self {
            recognizers,
            moving_threshold: analysis.moving_threshold_px,
            log: BehaviorLog::new(behavior.retention_events, behavior.retention_horizon()),
        }
    }

    /// Events completed by this detection, in recognizer order.
    pub fn observe(&mut self, detection: &DetectionResult) -> Vec<BehaviorEvent> {
        let signal = BehaviorSignal::from_detection(detection, self.moving_threshold);
        if signal.motion_reset {
            debug!("Resetting behaviour recognizers at frame {}", signal.sequence);
            self.recognizers.iter_mut().for_each(|r| r.reset());
        }

        let events: Vec<BehaviorEvent> = self
            .recognizers
            .iter_mut()
            .filter_map(|recognizer| recognizer.observe(&signal))
            .collect();
        for event in &events {
            debug!(
                "Behaviour {} {:?} over frames {}..={}",
                event.kind, event.outcome, event.start_sequence, event.end_sequence
            );
            self.log.record(event.clone());
        }
        self.log.expire(signal.timestamp);
        events
    }

    pub fn log(&self) -> &BehaviorLog {
        &self.log
    }

    pub fn states(&self) -> Vec<(BehaviorKind, &'static str)> {
        self.recognizers.iter().map(|r| (r.kind(), r.state_name())).collect()
    }
}
