use super::event::{BehaviorEvent, BehaviorKind, BehaviorSignal, Mark, Outcome, PatternRecognizer};
use crate::config::BehaviorConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Peeking { mark: Mark },
    Holding { mark: Mark, frames: usize, speed_sum: f32 },
}

/// Peek into contact, then hold still on the angle.
pub struct PeekAndHoldRecognizer {
    hold_frames: usize,
    moving_threshold: f32,
    state: State,
}

impl PeekAndHoldRecognizer {
    pub fn new(config: &BehaviorConfig, moving_threshold: f32) -> Self {
        Self {
            hold_frames: config.hold_frames.max(1),
            moving_threshold,
            state: State::Idle,
        }
    }

    fn hold(&mut self, mark: Mark, frames: usize, speed_sum: f32, signal: &BehaviorSignal) -> Option<BehaviorEvent> {
        if frames >= self.hold_frames {
            self.state = State::Idle;
            // stillness over the hold
            let mean_speed = speed_sum / frames as f32;
            let confidence = 1.0 - (mean_speed / self.moving_threshold.max(f32::EPSILON)).min(1.0);
            return Some(mark.close(BehaviorKind::PeekAndHold, Outcome::Confirmed, signal, confidence));
        }
        self.state = State::Holding {
            mark,
            frames,
            speed_sum,
        };
        None
    }
}

impl PatternRecognizer for PeekAndHoldRecognizer {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::PeekAndHold
    }

    fn observe(&mut self, signal: &BehaviorSignal) -> Option<BehaviorEvent> {
        let in_contact = signal.opponents_visible > 0;
        match self.state {
            State::Idle => {
                if signal.moving {
                    self.state = State::Peeking {
                        mark: Mark::at(signal),
                    };
                }
                None
            }
            State::Peeking { mark } => {
                if signal.moving {
                    return None;
                }
                if in_contact {
                    return self.hold(mark, 1, signal.speed, signal);
                }
                self.state = State::Idle;
                None
            }
            State::Holding {
                mark,
                frames,
                speed_sum,
            } => {
                if !in_contact {
                    self.state = State::Idle;
                    return None;
                }
                if signal.moving {
                    self.state = State::Idle;
                    let confidence = (signal.speed / (2.0 * self.moving_threshold.max(f32::EPSILON))).min(1.0);
                    return Some(mark.close(BehaviorKind::PeekAndHold, Outcome::Violated, signal, confidence));
                }
                self.hold(mark, frames + 1, speed_sum + signal.speed, signal)
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "idle",
            State::Peeking { .. } => "peeking",
            State::Holding { .. } => "holding",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::behavior::event::test_support::{feed, signal};

    fn recognizer() -> PeekAndHoldRecognizer {
        PeekAndHoldRecognizer::new(&BehaviorConfig::default(), 1.5)
    }

    #[test]
    fn holding_still_on_contact_confirms() {
        let mut recognizer = recognizer();
        let mut signals = vec![signal(1, 6.0, false, 0), signal(2, 6.0, false, 0)];
        signals.extend((3..=8).map(|s| signal(s, 0.0, false, 1)));
        let events = feed(&mut recognizer, &signals);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::Confirmed);
        assert_eq!(events[0].end_sequence, 8);
        assert_eq!(events[0].confidence, 1.0);
    }

    #[test]
    fn moving_while_holding_violates() {
        let mut recognizer = recognizer();
        let events = feed(
            &mut recognizer,
            &[
                signal(1, 6.0, false, 0),
                signal(2, 0.0, false, 1),
                signal(3, 0.0, false, 1),
                signal(4, 4.5, false, 1),
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::Violated);
        assert_eq!(events[0].confidence, 1.0);
    }

    #[test]
    fn losing_sight_returns_to_idle() {
        let mut recognizer = recognizer();
        let events = feed(
            &mut recognizer,
            &[
                signal(1, 6.0, false, 0),
                signal(2, 0.0, false, 1),
                signal(3, 0.0, false, 0),
                signal(4, 4.5, false, 1),
            ],
        );
        assert!(events.is_empty());
        assert_eq!(recognizer.state_name(), "peeking");
    }

    #[test]
    fn stopping_without_contact_is_not_a_peek() {
        let mut recognizer = recognizer();
        feed(&mut recognizer, &[signal(1, 6.0, false, 0), signal(2, 0.0, false, 0)]);
        assert_eq!(recognizer.state_name(), "idle");
    }
}
