pub mod behavior;
pub mod game_analyzer;
pub mod skill_assessor;
pub mod snapshot;

pub use behavior::{BehaviorAnalyzer, BehaviorEvent, BehaviorKind, BehaviorLog, Outcome};
pub use game_analyzer::GameAnalyzer;
pub use skill_assessor::{CategoryScore, SkillAssessor, SkillCategory, SkillLevel, SkillScores};
pub use snapshot::{PerformanceMetrics, PerformanceSnapshot};
