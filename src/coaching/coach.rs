use super::session::{Admission, CoachingUpdate, EndReason, RejectReason, Session, SessionReport};
use super::tip_rule::{default_catalogue, TipRule};
use crate::common::frame::Frame;
use crate::config::Configuration;
use crate::error::SessionError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

enum Phase {
    Idle,
    Running(Box<Session>),
    Ended(Arc<SessionReport>),
}

/// Result of handing one frame to a running coach.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    Published(Arc<CoachingUpdate>),
    Rejected(RejectReason),
    /// The frame fell past the session duration; the session has ended.
    Expired(Arc<SessionReport>),
}

/// Session lifecycle owner: `idle -> running -> ended`, never back.
///
/// Each accepted frame drives one pass; the resulting update is published
/// atomically as a whole `Arc` through a watch channel.
pub struct Coach {
    config: Arc<Configuration>,
    rules: Option<Vec<TipRule>>,
    phase: Phase,
    updates: watch::Sender<Option<Arc<CoachingUpdate>>>,
}

impl Coach {
    pub fn new(config: Arc<Configuration>) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            config,
            rules: None,
            phase: Phase::Idle,
            updates,
        }
    }

    /// Replace the built-in tip catalogue.
    pub fn with_rules(mut self, rules: Vec<TipRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn start(&mut self) -> Result<Uuid, SessionError> {
        match self.phase {
            Phase::Running(_) => return Err(SessionError::AlreadyStarted),
            Phase::Ended(_) => return Err(SessionError::Ended),
            Phase::Idle => {}
        }

        self.config.validate()?;
        let rules = self
            .rules
            .clone()
            .unwrap_or_else(|| default_catalogue(&self.config.coaching));
        let session = Session::new(Arc::clone(&self.config), rules)?;
        let id = session.id();
        info!(
            "Coaching session {} started ({} fps, window {})",
            id, self.config.capture.target_fps, self.config.analysis.window_size
        );
        self.phase = Phase::Running(Box::new(session));
        Ok(id)
    }

    pub fn process_frame(&mut self, frame: Frame) -> Result<PassOutcome, SessionError> {
        let session = match &mut self.phase {
            Phase::Running(session) => session,
            Phase::Idle => return Err(SessionError::NotRunning),
            Phase::Ended(_) => return Err(SessionError::Ended),
        };

        match session.admit(&frame) {
            Admission::Reject(reason) => Ok(PassOutcome::Rejected(reason)),
            Admission::Expire => Ok(PassOutcome::Expired(self.end(EndReason::Timeout)?)),
            Admission::Accept => {
                let update = Arc::new(session.run_pass(frame));
                self.updates.send_replace(Some(Arc::clone(&update)));
                Ok(PassOutcome::Published(update))
            }
        }
    }

    /// End the session and produce its report. Stopping an ended coach returns the same report.
    pub fn stop(&mut self) -> Result<Arc<SessionReport>, SessionError> {
        self.end(EndReason::Stopped)
    }

    fn end(&mut self, reason: EndReason) -> Result<Arc<SessionReport>, SessionError> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Running(session) => {
                let report = Arc::new(session.into_report(reason));
                info!(
                    "Coaching session {} ended ({:?}) after {} frames, {} tips, overall {:.2}",
                    report.session_id,
                    reason,
                    report.frames_processed,
                    report.tip_history.len(),
                    report.scores.overall
                );
                self.phase = Phase::Ended(Arc::clone(&report));
                Ok(report)
            }
            Phase::Ended(report) => {
                self.phase = Phase::Ended(Arc::clone(&report));
                Ok(report)
            }
            Phase::Idle => Err(SessionError::NotRunning),
        }
    }

    /// Last published update, if any pass has run.
    pub fn latest(&self) -> Option<Arc<CoachingUpdate>> {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CoachingUpdate>>> {
        self.updates.subscribe()
    }

    pub fn report(&self) -> Option<Arc<SessionReport>> {
        match &self.phase {
            Phase::Ended(report) => Some(Arc::clone(report)),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    pub fn config(&self) -> &Arc<Configuration> {
        &self.config
    }
}
