use super::event::{BehaviorEvent, BehaviorKind, Outcome};
use crate::common::ring_buffer::RingBuffer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub confirmed: u64,
    pub violated: u64,
}

/// Lifetime counts per pattern; these survive eviction from the retained log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSummary {
    pub tallies: IndexMap<BehaviorKind, OutcomeTally>,
    pub retained: usize,
    pub evicted: u64,
}

/// Append-only event log bounded by count and by age.
pub struct BehaviorLog {
    events: RingBuffer<BehaviorEvent>,
    horizon: Duration,
    tallies: IndexMap<BehaviorKind, OutcomeTally>,
    evicted: u64,
}

impl BehaviorLog {
    pub fn new(capacity: usize, horizon: Duration) -> Self {
        let tallies = BehaviorKind::ALL
            .into_iter()
            .map(|kind| (kind, OutcomeTally::default()))
            .collect();
        Self {
            events: RingBuffer::new(capacity),
            horizon,
            tallies,
            evicted: 0,
        }
    }

    pub fn record(&mut self, event: BehaviorEvent) {
        let tally = self.tallies.entry(event.kind).or_default();
        match event.outcome {
            Outcome::Confirmed => tally.confirmed += 1,
            Outcome::Violated => tally.violated += 1,
        }
        if self.events.push(event).is_some() {
            self.evicted += 1;
        }
    }

    /// Drop events that ended more than the retention horizon before `now`.
    pub fn expire(&mut self, now: Duration) {
        while let Some(oldest) = self.events.front() {
            if now.saturating_sub(oldest.ended_at) <= self.horizon {
                break;
            }
            self.events.pop_front();
            self.evicted += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> Vec<BehaviorEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn summary(&self) -> BehaviorSummary {
        BehaviorSummary {
            tallies: self.tallies.clone(),
            retained: self.events.len(),
            evicted: self.evicted,
        }
    }
}
