pub mod coach;
pub mod session;
pub mod tip_generator;
pub mod tip_rule;
pub mod training_plan;

pub use coach::{Coach, PassOutcome};
pub use session::{CoachingUpdate, EndReason, RejectReason, Session, SessionReport};
pub use tip_generator::{CoachingState, Tip, TipGenerator};
pub use tip_rule::{default_catalogue, Metric, MetricView, TipCategory, TipPriority, TipRule, TipTrigger};
pub use training_plan::{FocusArea, TrainingPlan};
