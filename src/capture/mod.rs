pub mod crosshair;
pub mod detection;
pub mod frame_processor;
pub mod indicator;
pub mod motion;
pub mod opponents;

pub use crosshair::CrosshairDetector;
pub use detection::{DetectionResult, FrameDetector, Opponent};
pub use frame_processor::FrameProcessor;
pub use indicator::FireIndicatorDetector;
pub use motion::{MotionEstimator, MotionReference};
pub use opponents::OpponentDetector;
