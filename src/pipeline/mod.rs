pub mod frame_queue;
pub mod metrics;
pub mod sink;

pub use frame_queue::{FrameQueue, PushOutcome};
pub use metrics::{FrameMetrics, PerformanceMonitor, PipelineStage, PipelineStats};
pub use sink::{InMemorySink, ReportSink, TracingSink};
