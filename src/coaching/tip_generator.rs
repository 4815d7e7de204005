use super::tip_rule::{validate_catalogue, MetricView, TipCategory, TipPriority, TipRule};
use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// A coaching tip emitted during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    /// 1-based emission order within the session.
    pub number: usize,
    pub rule_id: String,
    pub category: TipCategory,
    pub priority: TipPriority,
    pub message: String,
    pub emitted_at: Duration,
}

/// Per-session rate-limiting bookkeeping. Mutated only by the tip generator.
#[derive(Debug, Clone)]
pub struct CoachingState {
    last_emitted: IndexMap<String, Duration>,
    emitted: usize,
    max_tips: usize,
    history: Vec<Tip>,
}

impl CoachingState {
    pub fn new(max_tips: usize) -> Self {
        Self {
            last_emitted: IndexMap::new(),
            emitted: 0,
            max_tips,
            history: Vec::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.emitted >= self.max_tips
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn last_emitted(&self, rule_id: &str) -> Option<Duration> {
        self.last_emitted.get(rule_id).copied()
    }

    pub fn history(&self) -> &[Tip] {
        &self.history
    }

    fn cooled_down(&self, rule: &TipRule, now: Duration) -> bool {
        self.last_emitted(&rule.id)
            .map_or(true, |last| now.saturating_sub(last) >= rule.cooldown)
    }

    fn record(&mut self, tip: Tip) {
        self.last_emitted.insert(tip.rule_id.clone(), tip.emitted_at);
        self.emitted += 1;
        self.history.push(tip);
    }
}

/// Rule engine selecting at most one tip per evaluation.
pub struct TipGenerator {
    rules: Vec<TipRule>,
    state: CoachingState,
}

impl TipGenerator {
    pub fn new(rules: Vec<TipRule>, max_tips: usize) -> Result<Self, ConfigError> {
        validate_catalogue(&rules)?;
        Ok(Self {
            rules,
            state: CoachingState::new(max_tips),
        })
    }

    /// Candidates are rules whose trigger holds and whose cooldown has elapsed.
    /// The winner has the highest priority, then the largest deficit, then the
    /// lowest catalogue position.
    pub fn evaluate(&mut self, view: &MetricView<'_>, now: Duration) -> Option<Tip> {
        if self.state.is_exhausted() {
            return None;
        }

        let (_, rule, hit) = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| self.state.cooled_down(rule, now))
            .filter_map(|(index, rule)| rule.trigger.evaluate(view).map(|hit| (index, rule, hit)))
            .max_by(|a, b| {
                a.1.priority
                    .cmp(&b.1.priority)
                    .then(a.2.deficit.total_cmp(&b.2.deficit))
                    .then(b.0.cmp(&a.0))
            })?;

        let tip = Tip {
            number: self.state.emitted() + 1,
            rule_id: rule.id.clone(),
            category: rule.category,
            priority: rule.priority,
            message: rule.render(&hit),
            emitted_at: now,
        };
        info!(
            "Tip #{} [{}/{:?}] {}",
            tip.number, tip.rule_id, tip.priority, tip.message
        );
        self.state.record(tip.clone());
        Some(tip)
    }

    pub fn state(&self) -> &CoachingState {
        &self.state
    }
}
