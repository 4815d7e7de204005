use super::event::{BehaviorEvent, BehaviorKind, BehaviorSignal, Mark, Outcome, PatternRecognizer};
use crate::config::BehaviorConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Advancing { mark: Mark, frames: usize },
}

/// Pushing on through contact with several opponents in view.
pub struct OverExtensionRecognizer {
    extension_frames: usize,
    exposure_opponents: usize,
    state: State,
}

impl OverExtensionRecognizer {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            extension_frames: config.extension_frames.max(1),
            exposure_opponents: config.exposure_opponents.max(1),
            state: State::Idle,
        }
    }
}

impl PatternRecognizer for OverExtensionRecognizer {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::OverExtension
    }

    fn observe(&mut self, signal: &BehaviorSignal) -> Option<BehaviorEvent> {
        match self.state {
            State::Idle => {
                if signal.moving {
                    self.state = State::Advancing {
                        mark: Mark::at(signal),
                        frames: 1,
                    };
                }
                None
            }
            State::Advancing { mark, frames } if signal.moving => {
                let frames = frames + 1;
                if frames >= self.extension_frames && signal.opponents_visible >= self.exposure_opponents {
                    self.state = State::Idle;
                    let extra = (signal.opponents_visible - self.exposure_opponents) as f32;
                    return Some(mark.close(
                        BehaviorKind::OverExtension,
                        Outcome::Violated,
                        signal,
                        0.5 + 0.25 * extra,
                    ));
                }
                self.state = State::Advancing { mark, frames };
                None
            }
            State::Advancing { mark, frames } => {
                self.state = State::Idle;
                if signal.opponents_visible == 0 {
                    return None;
                }
                // the earlier the stop, the cleaner the take
                let overrun = (frames as f32 / self.extension_frames as f32).min(1.0);
                Some(mark.close(
                    BehaviorKind::OverExtension,
                    Outcome::Confirmed,
                    signal,
                    1.0 - 0.5 * overrun,
                ))
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "idle",
            State::Advancing { .. } => "advancing",
        }
    }
}
