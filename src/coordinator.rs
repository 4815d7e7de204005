use crate::{
    coaching::{Coach, CoachingUpdate, PassOutcome, SessionReport, TipRule},
    common::frame::Frame,
    config::Configuration,
    error::AppError,
    pipeline::{FrameQueue, PushOutcome, ReportSink, TracingSink},
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type SessionTask = JoinHandle<Result<Arc<SessionReport>, AppError>>;

/// Runs one coaching session on a background task, fed through a bounded frame queue.
pub struct Coordinator {
    session_id: Uuid,
    queue: Arc<FrameQueue>,
    updates: watch::Receiver<Option<Arc<CoachingUpdate>>>,
    session_task: Option<SessionTask>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn new(mut coach: Coach, sink: Arc<dyn ReportSink>) -> Result<Self, AppError> {
        let session_id = coach.start()?;
        let queue = Arc::new(FrameQueue::new(coach.config().capture.queue_capacity));
        let updates = coach.subscribe();
        let cancel_token = CancellationToken::new();
        let session_task =
            Self::start_session_task(coach, Arc::clone(&queue), sink, cancel_token.clone());

        Ok(Self {
            session_id,
            queue,
            updates,
            session_task: Some(session_task),
            cancel_token,
        })
    }

    fn start_session_task(
        coach: Coach,
        queue: Arc<FrameQueue>,
        sink: Arc<dyn ReportSink>,
        cancel_token: CancellationToken,
    ) -> SessionTask {
        tokio::spawn(Self::run_session(coach, queue, sink, cancel_token))
    }

    async fn run_session(
        mut coach: Coach,
        queue: Arc<FrameQueue>,
        sink: Arc<dyn ReportSink>,
        cancel_token: CancellationToken,
    ) -> Result<Arc<SessionReport>, AppError> {
        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                frame = queue.pop() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };

            match coach.process_frame(frame)? {
                PassOutcome::Published(update) => {
                    if let Err(e) = sink.publish(&update).await {
                        warn!("Sink rejected update {}: {}", update.sequence, e);
                    }
                }
                PassOutcome::Rejected(reason) => {
                    debug!("Frame rejected: {:?}", reason);
                }
                PassOutcome::Expired(report) => {
                    queue.close();
                    Self::flush(sink.as_ref(), &report, queue.dropped()).await;
                    return Ok(report);
                }
            }
        }

        queue.close();
        let report = coach.stop()?;
        Self::flush(sink.as_ref(), &report, queue.dropped()).await;
        Ok(report)
    }

    async fn flush(sink: &dyn ReportSink, report: &SessionReport, dropped: u64) {
        if dropped > 0 {
            info!("{} frames dropped by the capture queue", dropped);
        }
        if let Err(e) = sink.session_ended(report).await {
            warn!("Sink rejected report for session {}: {}", report.session_id, e);
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Hand a captured frame to the session. Never blocks.
    pub fn push(&self, frame: Frame) -> PushOutcome {
        self.queue.push(frame)
    }

    pub fn updates(&self) -> watch::Receiver<Option<Arc<CoachingUpdate>>> {
        self.updates.clone()
    }

    /// Stop processing; frames still queued are discarded.
    pub fn stop(&self) {
        self.cancel_token.cancel();
        self.queue.close();
    }

    /// Let the session drain its queue, then return its report.
    pub async fn finish(mut self) -> Result<Arc<SessionReport>, AppError> {
        self.queue.close();
        let task = self
            .session_task
            .take()
            .ok_or_else(|| AppError::SessionAborted("session task already joined".to_string()))?;
        task.await.map_err(|e| {
            error!("Session {} aborted: {}", self.session_id, e);
            AppError::SessionAborted(e.to_string())
        })?
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    sink: Option<Arc<dyn ReportSink>>,
    rules: Option<Vec<TipRule>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            sink: None,
            rules: None,
        }
    }

    // Defaults to logging through tracing when unset.
    pub fn sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn rules(mut self, rules: Vec<TipRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    // Adjusts the frame queue capacity, this will override the configuration.
    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.configuration.capture.queue_capacity = queue_capacity;
        self
    }

    /// Starts the session. Configuration faults surface here.
    pub fn build(self) -> Result<Coordinator, AppError> {
        let mut coach = Coach::new(Arc::new(self.configuration));
        if let Some(rules) = self.rules {
            coach = coach.with_rules(rules);
        }
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        Coordinator::new(coach, sink)
    }
}
