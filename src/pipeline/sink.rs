use crate::coaching::{CoachingUpdate, SessionReport};
use crate::common::ring_buffer::RingBuffer;
use crate::error::SinkError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// External consumer of coaching output (dashboard, log, persistence).
///
/// Failures are reported back but never end the session.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, update: &CoachingUpdate) -> Result<(), SinkError>;

    async fn session_ended(&self, report: &SessionReport) -> Result<(), SinkError>;
}

struct Recorded {
    updates: RingBuffer<Arc<CoachingUpdate>>,
    reports: Vec<Arc<SessionReport>>,
}

/// In-memory sink keeping the most recent updates (for testing and development)
#[derive(Clone)]
pub struct InMemorySink {
    recorded: Arc<Mutex<Recorded>>,
}

impl InMemorySink {
    pub fn new(max_updates: usize) -> Self {
        Self {
            recorded: Arc::new(Mutex::new(Recorded {
                updates: RingBuffer::new(max_updates),
                reports: Vec::new(),
            })),
        }
    }

    pub fn updates(&self) -> Vec<Arc<CoachingUpdate>> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .updates
            .iter()
            .cloned()
            .collect()
    }

    pub fn reports(&self) -> Vec<Arc<SessionReport>> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reports
            .clone()
    }
}

#[async_trait]
impl ReportSink for InMemorySink {
    async fn publish(&self, update: &CoachingUpdate) -> Result<(), SinkError> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .updates
            .push(Arc::new(update.clone()));
        Ok(())
    }

    async fn session_ended(&self, report: &SessionReport) -> Result<(), SinkError> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reports
            .push(Arc::new(report.clone()));
        Ok(())
    }
}

/// Writes tips and the final report as structured log lines.
pub struct TracingSink;

#[async_trait]
impl ReportSink for TracingSink {
    async fn publish(&self, update: &CoachingUpdate) -> Result<(), SinkError> {
        if let Some(tip) = &update.tip {
            info!(
                session = %update.session_id,
                sequence = update.sequence,
                rule = %tip.rule_id,
                "{}",
                tip.message
            );
        }
        Ok(())
    }

    async fn session_ended(&self, report: &SessionReport) -> Result<(), SinkError> {
        let json = serde_json::to_string(report)?;
        info!(session = %report.session_id, "Session report: {}", json);
        Ok(())
    }
}
