use crate::analysis::{SkillCategory, SkillLevel, SkillScores};
use crate::config::SkillConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusArea {
    pub category: SkillCategory,
    pub score: f32,
    /// Score at which the next skill level starts.
    pub target: f32,
    pub exercises: Vec<String>,
}

/// Personalised practice plan derived from the final skill scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub level: SkillLevel,
    pub focus_areas: Vec<FocusArea>,
}

impl TrainingPlan {
    /// Every category under `plan_threshold`, weakest first; the single weakest
    /// category when none is.
    pub fn build(scores: &SkillScores, config: &SkillConfig) -> Self {
        let ranked = scores.ranked();
        let mut weak: Vec<_> = ranked
            .iter()
            .copied()
            .filter(|(_, score)| *score < config.plan_threshold)
            .collect();
        if weak.is_empty() {
            weak.extend(ranked.first().copied());
        }

        let focus_areas = weak
            .into_iter()
            .map(|(category, score)| FocusArea {
                category,
                score,
                target: next_target(score, config),
                exercises: exercises(category).iter().map(|e| e.to_string()).collect(),
            })
            .collect();

        Self {
            level: SkillLevel::from_score(scores.overall, config),
            focus_areas,
        }
    }
}

fn next_target(score: f32, config: &SkillConfig) -> f32 {
    if score < config.intermediate_threshold {
        config.intermediate_threshold
    } else if score < config.advanced_threshold {
        config.advanced_threshold
    } else {
        1.0
    }
}

fn exercises(category: SkillCategory) -> &'static [&'static str] {
    match category {
        SkillCategory::Mechanics => &[
            "Aim trainer: 10 minutes of flick and tracking drills",
            "Counter-strafe drill: strafe, tap the opposite key, fire; 50 repetitions",
            "Spray control: three recoil patterns against a wall",
        ],
        SkillCategory::Positioning => &[
            "Pre-aim common angles at head height on an empty server",
            "Deathmatch focusing only on crosshair placement",
            "Review deaths and note where you were caught off-angle",
        ],
        SkillCategory::GameSense => &[
            "Watch one professional demo from your role's perspective",
            "Call out opponent positions aloud every round",
            "Hold one angle per round instead of swinging wide",
        ],
    }
}
