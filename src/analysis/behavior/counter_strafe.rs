use super::event::{BehaviorEvent, BehaviorKind, BehaviorSignal, Mark, Outcome, PatternRecognizer};
use crate::config::BehaviorConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Moving { mark: Mark, peak: f32 },
    Decelerating { mark: Mark, peak: f32, frames: usize },
}

/// Shooting only once movement has been cancelled.
///
/// `Idle -> Moving`; a shot while still at speed is a violation. Dropping
/// below `decel_ratio` of the peak speed (or under the stop threshold) enters
/// `Decelerating`, where a shot within `lookback_frames` confirms.
pub struct CounterStrafeRecognizer {
    decel_ratio: f32,
    stop_threshold: f32,
    lookback: usize,
    state: State,
}

impl CounterStrafeRecognizer {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            decel_ratio: config.decel_ratio,
            stop_threshold: config.stop_threshold_px,
            lookback: config.lookback_frames.max(1),
            state: State::Idle,
        }
    }

    fn decelerated(&self, speed: f32, peak: f32) -> bool {
        speed <= peak * self.decel_ratio || speed < self.stop_threshold
    }

    fn confirm(mark: Mark, peak: f32, signal: &BehaviorSignal) -> BehaviorEvent {
        let residual = if peak > 0.0 { signal.speed / peak } else { 0.0 };
        mark.close(BehaviorKind::CounterStrafe, Outcome::Confirmed, signal, 1.0 - residual)
    }
}

impl PatternRecognizer for CounterStrafeRecognizer {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::CounterStrafe
    }

    fn observe(&mut self, signal: &BehaviorSignal) -> Option<BehaviorEvent> {
        match self.state {
            State::Idle => {
                if signal.moving {
                    self.state = State::Moving {
                        mark: Mark::at(signal),
                        peak: signal.speed,
                    };
                }
                None
            }
            State::Moving { mark, peak } => {
                let peak = peak.max(signal.speed);
                if self.decelerated(signal.speed, peak) {
                    if signal.fired {
                        self.state = State::Idle;
                        return Some(Self::confirm(mark, peak, signal));
                    }
                    self.state = State::Decelerating {
                        mark,
                        peak,
                        frames: 0,
                    };
                    return None;
                }
                if signal.fired {
                    self.state = State::Idle;
                    let confidence = signal.speed / peak;
                    return Some(mark.close(BehaviorKind::CounterStrafe, Outcome::Violated, signal, confidence));
                }
                self.state = State::Moving { mark, peak };
                None
            }
            State::Decelerating { mark, peak, frames } => {
                if signal.moving && !self.decelerated(signal.speed, peak) {
                    // re-accelerated; judge the next shot as a moving one
                    self.state = State::Moving { mark, peak };
                    return self.observe(signal);
                }
                if signal.fired {
                    self.state = State::Idle;
                    return Some(Self::confirm(mark, peak, signal));
                }
                let frames = frames + 1;
                self.state = if frames >= self.lookback {
                    State::Idle
                } else {
                    State::Decelerating { mark, peak, frames }
                };
                None
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "idle",
            State::Moving { .. } => "moving",
            State::Decelerating { .. } => "decelerating",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::behavior::event::test_support::{feed, signal};

    fn recognizer() -> CounterStrafeRecognizer {
        CounterStrafeRecognizer::new(&BehaviorConfig::default())
    }

    #[test]
    fn shot_after_stopping_confirms() {
        let mut recognizer = recognizer();
        let events = feed(
            &mut recognizer,
            &[
                signal(1, 8.0, false, 1),
                signal(2, 10.0, false, 1),
                signal(3, 2.0, false, 1),
                signal(4, 0.0, true, 1),
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::Confirmed);
        assert_eq!((events[0].start_sequence, events[0].end_sequence), (1, 4));
        assert_eq!(events[0].confidence, 1.0);
        assert_eq!(recognizer.state_name(), "idle");
    }

    #[test]
    fn shot_at_speed_violates() {
        let mut recognizer = recognizer();
        let events = feed(
            &mut recognizer,
            &[signal(1, 10.0, false, 1), signal(2, 9.0, true, 1)],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::Violated);
        assert!((events[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn late_shot_outside_lookback_is_ignored() {
        let mut recognizer = recognizer();
        let mut signals = vec![signal(1, 10.0, false, 0), signal(2, 0.0, false, 0)];
        signals.extend((3..=6).map(|s| signal(s, 0.0, false, 0)));
        signals.push(signal(7, 0.0, true, 0));
        assert!(feed(&mut recognizer, &signals).is_empty());
        assert_eq!(recognizer.state_name(), "idle");
    }

    #[test]
    fn reacceleration_turns_shot_into_violation() {
        let mut recognizer = recognizer();
        let events = feed(
            &mut recognizer,
            &[
                signal(1, 10.0, false, 0),
                signal(2, 3.0, false, 0),
                signal(3, 9.0, true, 0),
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::Violated);
    }

    #[test]
    fn reset_drops_partial_pattern() {
        let mut recognizer = recognizer();
        recognizer.observe(&signal(1, 10.0, false, 0));
        recognizer.reset();
        assert!(recognizer.observe(&signal(2, 0.0, true, 0)).is_none());
    }
}
