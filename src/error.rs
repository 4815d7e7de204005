use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Settings Error: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("Session Error: {0}")]
    Session(#[from] SessionError),
    #[error("Frame Error: {0}")]
    Frame(#[from] FrameError),
    #[error("Sink Error: {0}")]
    Sink(#[from] SinkError),
    #[error("Coaching session aborted: {0}")]
    SessionAborted(String),
}

// Configuration faults, fatal at session start
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Target FPS must be greater than 0, got {0}")]
    InvalidFrameRate(f32),
    #[error("Frame queue capacity must be greater than 0")]
    EmptyQueue,
    #[error("Analysis window size must be greater than 0")]
    EmptyWindow,
    #[error("Minimum samples ({min_samples}) exceeds the window size ({window_size})")]
    MinSamplesExceedWindow {
        min_samples: usize,
        window_size: usize,
    },
    #[error("Skill decay must be in (0, 1], got {0}")]
    InvalidDecay(f32),
    #[error("Skill weights must sum to 1.0, got {0}")]
    WeightsNotNormalized(f32),
    #[error("Skill weight '{name}' must be a finite, non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f32 },
    #[error("Cooldown for '{rule}' must be a non-negative number of seconds within Duration range, got {seconds}")]
    InvalidCooldown { rule: String, seconds: f64 },
    #[error("Threshold '{name}' must be between 0.0 and 1.0, got {value}")]
    ThresholdOutOfRange { name: String, value: f32 },
    #[error("'{name}' must be greater than 0")]
    NonPositive { name: &'static str },
    #[error("Color signature '{0}' has no ranges")]
    EmptySignature(&'static str),
    #[error("Tip rule '{0}' is defined more than once")]
    DuplicateRule(String),
    #[error("Session duration must be a positive number of seconds within Duration range, got {0}")]
    InvalidSessionDuration(f64),
    #[error("Behavior retention horizon must be a positive number of seconds within Duration range, got {0}")]
    InvalidRetentionHorizon(f64),
}

// Session lifecycle faults
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("The coaching session is already running.")]
    AlreadyStarted,
    #[error("The coaching session is not running.")]
    NotRunning,
    #[error("The coaching session has ended; start a new coach instead.")]
    Ended,
    #[error("Refusing to start session: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to serialize coaching output: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Sink rejected coaching output: {0}")]
    Rejected(String),
}
