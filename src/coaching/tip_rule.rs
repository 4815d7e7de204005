use crate::analysis::{BehaviorEvent, BehaviorKind, PerformanceSnapshot, SkillCategory, SkillScores};
use crate::config::{seconds_to_duration, CoachingConfig};
use crate::error::ConfigError;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipCategory {
    CrosshairPlacement,
    Mechanics,
    Movement,
    Positioning,
    GameSense,
}

/// A value a trigger can read from the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    CrosshairPlacement,
    CrosshairStability,
    MovementEfficiency,
    ThreatLevel,
    TargetAwareness,
    Skill(SkillCategory),
    OverallSkill,
}

/// Everything a trigger may look at for one pass.
#[derive(Debug, Clone, Copy)]
pub struct MetricView<'a> {
    pub snapshot: &'a PerformanceSnapshot,
    pub scores: &'a SkillScores,
    pub events: &'a [BehaviorEvent],
}

impl MetricView<'_> {
    /// `None` for snapshot metrics of a low-confidence window or absent components.
    pub fn value(&self, metric: Metric) -> Option<f32> {
        match metric {
            Metric::Accuracy => self.snapshot.accuracy(),
            Metric::CrosshairPlacement => self.snapshot.crosshair_placement(),
            Metric::CrosshairStability => self.snapshot.crosshair_stability(),
            Metric::MovementEfficiency => self.snapshot.movement_efficiency(),
            Metric::ThreatLevel => self.snapshot.threat_level(),
            Metric::TargetAwareness => self.snapshot.target_awareness(),
            Metric::Skill(category) => Some(self.scores.get(category).value),
            Metric::OverallSkill => Some(self.scores.overall),
        }
    }
}

/// A trigger that currently holds, with how far past its threshold it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerHit {
    pub value: f32,
    pub threshold: f32,
    pub deficit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipTrigger {
    Below { metric: Metric, threshold: f32 },
    Above { metric: Metric, threshold: f32 },
    /// A violated event of this kind completed during the pass.
    Violation { kind: BehaviorKind },
}

impl TipTrigger {
    pub fn evaluate(&self, view: &MetricView<'_>) -> Option<TriggerHit> {
        match *self {
            TipTrigger::Below { metric, threshold } => {
                let value = view.value(metric)?;
                (value < threshold).then_some(TriggerHit {
                    value,
                    threshold,
                    deficit: threshold - value,
                })
            }
            TipTrigger::Above { metric, threshold } => {
                let value = view.value(metric)?;
                (value > threshold).then_some(TriggerHit {
                    value,
                    threshold,
                    deficit: value - threshold,
                })
            }
            TipTrigger::Violation { kind } => view
                .events
                .iter()
                .filter(|e| e.kind == kind && e.is_violation())
                .map(|e| e.confidence)
                .max_by(f32::total_cmp)
                .map(|confidence| TriggerHit {
                    value: confidence,
                    threshold: 0.0,
                    deficit: confidence,
                }),
        }
    }

    pub fn threshold(&self) -> Option<f32> {
        match self {
            TipTrigger::Below { threshold, .. } | TipTrigger::Above { threshold, .. } => Some(*threshold),
            TipTrigger::Violation { .. } => None,
        }
    }
}

/// Static coaching advice. Loaded once when the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipRule {
    pub id: String,
    pub category: TipCategory,
    pub priority: TipPriority,
    pub trigger: TipTrigger,
    /// Message with optional `{value}` / `{threshold}` placeholders, rendered as percentages.
    pub template: String,
    pub cooldown: Duration,
}

impl TipRule {
    pub fn new(
        id: impl Into<String>,
        category: TipCategory,
        priority: TipPriority,
        trigger: TipTrigger,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            priority,
            trigger,
            template: template.into(),
            cooldown: Duration::ZERO,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn render(&self, hit: &TriggerHit) -> String {
        self.template
            .replace("{value}", &percent(hit.value))
            .replace("{threshold}", &percent(hit.threshold))
    }
}

fn percent(value: f32) -> String {
    format!("{:.0}%", value * 100.0)
}

/// Rejects duplicate ids and thresholds outside [0, 1].
pub fn validate_catalogue(rules: &[TipRule]) -> Result<(), ConfigError> {
    let mut seen = IndexSet::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(ConfigError::DuplicateRule(rule.id.clone()));
        }
        if let Some(threshold) = rule.trigger.threshold() {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ThresholdOutOfRange {
                    name: format!("rule '{}'", rule.id),
                    value: threshold,
                });
            }
        }
    }
    Ok(())
}

/// Built-in rules, thresholds and cooldowns taken from configuration.
pub fn default_catalogue(config: &CoachingConfig) -> Vec<TipRule> {
    let cooldown = |id: &str| seconds_to_duration(config.cooldown_secs(id));
    let rule = |id: &str, category, priority, trigger, template: &str| {
        TipRule::new(id, category, priority, trigger, template).with_cooldown(cooldown(id))
    };

    vec![
        rule(
            "crosshair_placement",
            TipCategory::CrosshairPlacement,
            TipPriority::High,
            TipTrigger::Below {
                metric: Metric::CrosshairPlacement,
                threshold: config.placement_threshold,
            },
            "Keep your crosshair at head height. Placement is {value}; aim for at least {threshold}.",
        ),
        rule(
            "accuracy",
            TipCategory::Mechanics,
            TipPriority::High,
            TipTrigger::Below {
                metric: Metric::Accuracy,
                threshold: config.accuracy_threshold,
            },
            "Only {value} of your shots are landing. Let the crosshair settle on target before firing.",
        ),
        rule(
            "counter_strafe",
            TipCategory::Movement,
            TipPriority::Medium,
            TipTrigger::Violation {
                kind: BehaviorKind::CounterStrafe,
            },
            "You fired while still moving. Tap the opposite strafe key to stop dead, then shoot.",
        ),
        rule(
            "movement_efficiency",
            TipCategory::Movement,
            TipPriority::Medium,
            TipTrigger::Below {
                metric: Metric::MovementEfficiency,
                threshold: config.movement_threshold,
            },
            "Movement efficiency is {value}. Stop before shooting and move with a purpose.",
        ),
        rule(
            "over_extension",
            TipCategory::Positioning,
            TipPriority::Medium,
            TipTrigger::Violation {
                kind: BehaviorKind::OverExtension,
            },
            "You pushed into several opponents at once. Take one fight at a time from a safer angle.",
        ),
        rule(
            "jittery_aim",
            TipCategory::Mechanics,
            TipPriority::Low,
            TipTrigger::Below {
                metric: Metric::CrosshairStability,
                threshold: config.stability_threshold,
            },
            "Your aim is jittery (stability {value}). Relax your grip and make smaller corrections.",
        ),
        rule(
            "game_sense",
            TipCategory::GameSense,
            TipPriority::Low,
            TipTrigger::Below {
                metric: Metric::Skill(SkillCategory::GameSense),
                threshold: config.game_sense_threshold,
            },
            "Game sense is at {value}. Keep your crosshair on the angles opponents come from.",
        ),
        rule(
            "high_threat",
            TipCategory::Positioning,
            TipPriority::Low,
            TipTrigger::Above {
                metric: Metric::ThreatLevel,
                threshold: config.threat_threshold,
            },
            "Threat level is {value}. Fall back to cover before re-engaging.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CategoryScore, Outcome, PerformanceMetrics};

    fn snapshot(placement: f32) -> PerformanceSnapshot {
        PerformanceSnapshot {
            first_sequence: 1,
            last_sequence: 30,
            started_at: Duration::ZERO,
            ended_at: Duration::from_secs(1),
            frames: 30,
            samples: 30,
            metrics: Some(PerformanceMetrics {
                accuracy: None,
                crosshair_placement: placement,
                crosshair_stability: 1.0,
                movement_efficiency: 1.0,
                threat_level: 0.0,
                target_awareness: None,
            }),
        }
    }

    fn scores() -> SkillScores {
        let score = CategoryScore {
            value: 0.5,
            samples: 0,
        };
        SkillScores {
            mechanics: score,
            positioning: score,
            game_sense: score,
            overall: 0.5,
        }
    }

    #[test]
    fn below_trigger_reports_deficit() {
        let snapshot = snapshot(0.2);
        let scores = scores();
        let view = MetricView {
            snapshot: &snapshot,
            scores: &scores,
            events: &[],
        };
        let trigger = TipTrigger::Below {
            metric: Metric::CrosshairPlacement,
            threshold: 0.5,
        };
        let hit = trigger.evaluate(&view).unwrap();
        assert!((hit.deficit - 0.3).abs() < 1e-6);
    }

    #[test]
    fn absent_metric_never_triggers() {
        let snapshot = snapshot(0.2);
        let scores = scores();
        let view = MetricView {
            snapshot: &snapshot,
            scores: &scores,
            events: &[],
        };
        let trigger = TipTrigger::Below {
            metric: Metric::Accuracy,
            threshold: 1.0,
        };
        assert_eq!(trigger.evaluate(&view), None);
    }

    #[test]
    fn violation_trigger_needs_matching_event() {
        let snapshot = snapshot(1.0);
        let scores = scores();
        let events = [BehaviorEvent {
            kind: BehaviorKind::CounterStrafe,
            outcome: Outcome::Violated,
            started_at: Duration::ZERO,
            ended_at: Duration::ZERO,
            start_sequence: 1,
            end_sequence: 2,
            confidence: 0.8,
        }];
        let view = MetricView {
            snapshot: &snapshot,
            scores: &scores,
            events: &events,
        };
        let counter = TipTrigger::Violation {
            kind: BehaviorKind::CounterStrafe,
        };
        let extension = TipTrigger::Violation {
            kind: BehaviorKind::OverExtension,
        };
        assert_eq!(counter.evaluate(&view).map(|h| h.deficit), Some(0.8));
        assert_eq!(extension.evaluate(&view), None);
    }

    #[test]
    fn renders_percent_placeholders() {
        let rule = default_catalogue(&CoachingConfig::default())
            .into_iter()
            .find(|r| r.id == "crosshair_placement")
            .unwrap();
        let message = rule.render(&TriggerHit {
            value: 0.234,
            threshold: 0.5,
            deficit: 0.266,
        });
        assert_eq!(
            message,
            "Keep your crosshair at head height. Placement is 23%; aim for at least 50%."
        );
        assert_eq!(rule.cooldown, Duration::from_secs(10));
    }

    #[test]
    fn default_catalogue_is_valid() {
        let rules = default_catalogue(&CoachingConfig::default());
        assert_eq!(rules.len(), 8);
        assert_eq!(validate_catalogue(&rules), Ok(()));
    }

    #[test]
    fn rejects_duplicate_rule_ids() {
        let mut rules = default_catalogue(&CoachingConfig::default());
        rules.push(rules[0].clone());
        assert_eq!(
            validate_catalogue(&rules),
            Err(ConfigError::DuplicateRule("crosshair_placement".to_string()))
        );
    }
}
