use super::behavior::{BehaviorEvent, Outcome};
use super::snapshot::PerformanceSnapshot;
use crate::config::SkillConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Mechanics,
    Positioning,
    GameSense,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 3] = [
        SkillCategory::Mechanics,
        SkillCategory::Positioning,
        SkillCategory::GameSense,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SkillCategory::Mechanics => "mechanics",
            SkillCategory::Positioning => "positioning",
            SkillCategory::GameSense => "game sense",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn from_score(value: f32, config: &SkillConfig) -> Self {
        if value >= config.advanced_threshold {
            SkillLevel::Advanced
        } else if value >= config.intermediate_threshold {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }
}

/// Smoothed value in [0, 1] plus the number of snapshots folded into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub value: f32,
    pub samples: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillScores {
    pub mechanics: CategoryScore,
    pub positioning: CategoryScore,
    pub game_sense: CategoryScore,
    pub overall: f32,
}

impl SkillScores {
    pub fn get(&self, category: SkillCategory) -> CategoryScore {
        match category {
            SkillCategory::Mechanics => self.mechanics,
            SkillCategory::Positioning => self.positioning,
            SkillCategory::GameSense => self.game_sense,
        }
    }

    fn get_mut(&mut self, category: SkillCategory) -> &mut CategoryScore {
        match category {
            SkillCategory::Mechanics => &mut self.mechanics,
            SkillCategory::Positioning => &mut self.positioning,
            SkillCategory::GameSense => &mut self.game_sense,
        }
    }

    /// Categories from weakest to strongest; ties keep declaration order.
    pub fn ranked(&self) -> Vec<(SkillCategory, f32)> {
        let mut ranked: Vec<_> = SkillCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category).value))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

/// Session-long skill estimator. Scores are smoothed, never reset.
pub struct SkillAssessor {
    config: SkillConfig,
    scores: SkillScores,
}

impl SkillAssessor {
    pub fn new(config: SkillConfig) -> Self {
        let prior = CategoryScore {
            value: config.prior.clamp(0.0, 1.0),
            samples: 0,
        };
        let mut scores = SkillScores {
            mechanics: prior,
            positioning: prior,
            game_sense: prior,
            overall: 0.0,
        };
        scores.overall = Self::overall(&config, &scores);
        Self { config, scores }
    }

    /// Fold one pass into the scores. Low-confidence snapshots leave values and
    /// sample counts untouched; behaviour events always apply.
    pub fn update(&mut self, snapshot: &PerformanceSnapshot, events: &[BehaviorEvent]) -> SkillScores {
        if let Some(metrics) = snapshot.metrics {
            let mechanics_inputs: Vec<f32> = [
                metrics.accuracy,
                Some(metrics.movement_efficiency),
                Some(metrics.crosshair_stability),
            ]
            .into_iter()
            .flatten()
            .collect();
            let mechanics = mechanics_inputs.iter().sum::<f32>() / mechanics_inputs.len() as f32;

            self.smooth(SkillCategory::Mechanics, mechanics);
            self.smooth(SkillCategory::Positioning, metrics.crosshair_placement);
            if let Some(awareness) = metrics.target_awareness {
                self.smooth(SkillCategory::GameSense, awareness);
            }
        }

        for event in events {
            let delta = match event.outcome {
                Outcome::Confirmed => self.config.event_delta,
                Outcome::Violated => -self.config.event_delta,
            };
            let score = self.scores.get_mut(event.kind.category());
            score.value = (score.value + delta).clamp(0.0, 1.0);
        }

        self.scores.overall = Self::overall(&self.config, &self.scores);
        self.scores
    }

    pub fn scores(&self) -> SkillScores {
        self.scores
    }

    pub fn level(&self) -> SkillLevel {
        SkillLevel::from_score(self.scores.overall, &self.config)
    }

    pub fn config(&self) -> &SkillConfig {
        &self.config
    }

    fn smooth(&mut self, category: SkillCategory, sample: f32) {
        let alpha = self.config.decay;
        let score = self.scores.get_mut(category);
        score.value = (score.value + alpha * (sample.clamp(0.0, 1.0) - score.value)).clamp(0.0, 1.0);
        score.samples += 1;
    }

    fn overall(config: &SkillConfig, scores: &SkillScores) -> f32 {
        let weights = config.weights;
        let weighted = weights.mechanics * scores.mechanics.value
            + weights.positioning * scores.positioning.value
            + weights.game_sense * scores.game_sense.value;
        let total = weights.sum();
        if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::behavior::BehaviorKind;
    use crate::analysis::snapshot::PerformanceMetrics;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::time::Duration;

    fn snapshot(metrics: Option<PerformanceMetrics>) -> PerformanceSnapshot {
        PerformanceSnapshot {
            first_sequence: 1,
            last_sequence: 30,
            started_at: Duration::ZERO,
            ended_at: Duration::from_secs(1),
            frames: 30,
            samples: if metrics.is_some() { 30 } else { 2 },
            metrics,
        }
    }

    fn metrics(value: f32) -> PerformanceMetrics {
        PerformanceMetrics {
            accuracy: Some(value),
            crosshair_placement: value,
            crosshair_stability: value,
            movement_efficiency: value,
            threat_level: 0.0,
            target_awareness: Some(value),
        }
    }

    fn event(kind: BehaviorKind, outcome: Outcome) -> BehaviorEvent {
        BehaviorEvent {
            kind,
            outcome,
            started_at: Duration::ZERO,
            ended_at: Duration::ZERO,
            start_sequence: 0,
            end_sequence: 0,
            confidence: 1.0,
        }
    }

    #[test]
    fn smooths_toward_samples() {
        let mut assessor = SkillAssessor::new(SkillConfig::default());
        let scores = assessor.update(&snapshot(Some(metrics(1.0))), &[]);
        assert!((scores.mechanics.value - 0.55).abs() < 1e-6);
        assert_eq!(scores.mechanics.samples, 1);
        assert!((scores.overall - 0.55).abs() < 1e-6);
    }

    #[test]
    fn low_confidence_snapshot_changes_nothing() {
        let mut assessor = SkillAssessor::new(SkillConfig::default());
        let before = assessor.scores();
        let after = assessor.update(&snapshot(None), &[]);
        assert_eq!(before, after);
    }

    #[test]
    fn missing_awareness_skips_game_sense() {
        let mut assessor = SkillAssessor::new(SkillConfig::default());
        let scores = assessor.update(
            &snapshot(Some(PerformanceMetrics {
                target_awareness: None,
                ..metrics(0.0)
            })),
            &[],
        );
        assert_eq!(scores.game_sense.samples, 0);
        assert_eq!(scores.game_sense.value, 0.5);
        assert_eq!(scores.positioning.samples, 1);
    }

    #[test]
    fn events_nudge_their_category() {
        let mut assessor = SkillAssessor::new(SkillConfig::default());
        let scores = assessor.update(
            &snapshot(None),
            &[
                event(BehaviorKind::CounterStrafe, Outcome::Confirmed),
                event(BehaviorKind::OverExtension, Outcome::Violated),
            ],
        );
        assert!((scores.mechanics.value - 0.52).abs() < 1e-6);
        assert!((scores.game_sense.value - 0.48).abs() < 1e-6);
        assert_eq!(scores.positioning.value, 0.5);
        assert_eq!(scores.mechanics.samples, 0);
    }

    #[test]
    fn event_nudges_are_clamped() {
        let config = SkillConfig {
            prior: 0.99,
            event_delta: 0.5,
            ..SkillConfig::default()
        };
        let mut assessor = SkillAssessor::new(config);
        let scores = assessor.update(
            &snapshot(None),
            &[event(BehaviorKind::PeekAndHold, Outcome::Confirmed)],
        );
        assert_eq!(scores.positioning.value, 1.0);
    }

    #[test]
    fn replay_is_deterministic() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(42);
            let mut assessor = SkillAssessor::new(SkillConfig::default());
            (0..500)
                .map(|_| {
                    let input = rng.random_bool(0.8).then(|| metrics(rng.random_range(0.0..=1.0)));
                    assessor.update(&snapshot(input), &[])
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn scores_stay_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut assessor = SkillAssessor::new(SkillConfig::default());
        for _ in 0..2_000 {
            let events: Vec<_> = (0..rng.random_range(0..3))
                .map(|_| {
                    let kind = BehaviorKind::ALL[rng.random_range(0..3)];
                    let outcome = if rng.random_bool(0.5) {
                        Outcome::Confirmed
                    } else {
                        Outcome::Violated
                    };
                    event(kind, outcome)
                })
                .collect();
            let input = rng.random_bool(0.7).then(|| metrics(rng.random_range(0.0..=1.0)));
            let scores = assessor.update(&snapshot(input), &events);
            for category in SkillCategory::ALL {
                assert!((0.0..=1.0).contains(&scores.get(category).value));
            }
            assert!((0.0..=1.0).contains(&scores.overall));
        }
    }

    #[test]
    fn levels_follow_thresholds() {
        let assessor = SkillAssessor::new(SkillConfig::default());
        assert_eq!(assessor.level(), SkillLevel::Beginner);
        let config = SkillConfig::default();
        assert_eq!(SkillLevel::from_score(0.65, &config), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_score(0.8, &config), SkillLevel::Advanced);
    }
}
