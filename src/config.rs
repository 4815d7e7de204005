use crate::error::ConfigError;
use image::Rgb;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Numeric parameters of a coaching session, loaded once before the session starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub capture: CaptureConfig,
    pub detection: DetectionConfig,
    pub analysis: AnalysisConfig,
    pub behavior: BehaviorConfig,
    pub skill: SkillConfig,
    pub coaching: CoachingConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub target_fps: f32,
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_fps: 30.0,
            queue_capacity: 4,
        }
    }
}

impl CaptureConfig {
    /// Processing budget for one frame at the target rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.target_fps.max(f32::EPSILON))
    }
}

/// Inclusive per-channel RGB range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

impl ColorRange {
    pub const fn new(min: [u8; 3], max: [u8; 3]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        (0..3).all(|c| pixel.0[c] >= self.min[c] && pixel.0[c] <= self.max[c])
    }

    /// 1.0 at the centre of the range, falling to 0.0 at its faces.
    pub fn purity(&self, pixel: &Rgb<u8>) -> f32 {
        let mut total = 0.0;
        for c in 0..3 {
            let half_span = (self.max[c] as f32 - self.min[c] as f32) / 2.0;
            if half_span <= 0.0 {
                total += 1.0;
                continue;
            }
            let center = self.min[c] as f32 + half_span;
            total += 1.0 - ((pixel.0[c] as f32 - center).abs() / half_span).min(1.0);
        }
        total / 3.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub reticle: ReticleConfig,
    pub opponents: OpponentConfig,
    pub fire_indicator: FireIndicatorConfig,
    pub motion: MotionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReticleConfig {
    /// Reticle anchor as fractions of frame width/height.
    pub anchor: (f32, f32),
    pub search_half_width: u32,
    pub search_half_height: u32,
    pub colors: Vec<ColorRange>,
    pub min_area: usize,
    pub max_area: usize,
    /// Largest allowed extent of the matched pixels along either axis.
    pub max_spread: u32,
    pub min_contrast: f32,
}

impl Default for ReticleConfig {
    fn default() -> Self {
        Self {
            anchor: (0.5, 0.5),
            search_half_width: 64,
            search_half_height: 64,
            colors: vec![
                // green, cyan, yellow reticles
                ColorRange::new([0, 200, 0], [90, 255, 90]),
                ColorRange::new([0, 200, 200], [90, 255, 255]),
                ColorRange::new([200, 200, 0], [255, 255, 90]),
            ],
            min_area: 4,
            max_area: 400,
            max_spread: 32,
            min_contrast: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentConfig {
    pub signature: Vec<ColorRange>,
    pub min_area: usize,
    pub min_confidence: f32,
    pub max_opponents: usize,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            // enemy highlight red
            signature: vec![ColorRange::new([170, 0, 0], [255, 90, 90])],
            min_area: 100,
            min_confidence: 0.3,
            max_opponents: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FireIndicatorConfig {
    /// [x, y, width, height] as fractions of the frame.
    pub region: [f32; 4],
    pub min_luma: u8,
    pub min_fill: f32,
}

impl Default for FireIndicatorConfig {
    fn default() -> Self {
        Self {
            region: [0.45, 0.9, 0.1, 0.08],
            min_luma: 230,
            min_fill: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub downsample: u32,
    pub max_points: usize,
    pub point_spacing: u32,
    pub patch_radius: u32,
    pub search_radius: u32,
    /// Minimum texture score for a point to be tracked.
    pub min_texture: f32,
    /// Mean absolute difference per patch pixel above which a match is rejected.
    pub max_match_error: f32,
    pub min_tracked: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            downsample: 2,
            max_points: 32,
            point_spacing: 8,
            patch_radius: 3,
            search_radius: 8,
            min_texture: 40.0,
            max_match_error: 12.0,
            min_tracked: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window_size: usize,
    pub min_samples: usize,
    /// Head height as the top fraction of an opponent box.
    pub head_fraction: f32,
    /// Fallback head line (fraction of frame height) when no opponent is visible.
    pub default_head_line: f32,
    pub default_band_half_height: f32,
    /// Vertical deviation at which a frame's placement penalty saturates.
    pub placement_tolerance_px: f32,
    pub moving_threshold_px: f32,
    pub strafe_tolerance_px: f32,
    /// Share of the movement penalty given to shooting while moving.
    pub fire_penalty_weight: f32,
    pub jitter_scale_px: f32,
    pub threat_radius_px: f32,
    /// Summed opponent proximity at which the threat level saturates.
    pub threat_saturation: f32,
    pub awareness_radius_px: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            min_samples: 10,
            head_fraction: 0.2,
            default_head_line: 0.5,
            default_band_half_height: 10.0,
            placement_tolerance_px: 100.0,
            moving_threshold_px: 1.5,
            strafe_tolerance_px: 8.0,
            fire_penalty_weight: 0.6,
            jitter_scale_px: 20.0,
            threat_radius_px: 400.0,
            threat_saturation: 2.0,
            awareness_radius_px: 120.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub lookback_frames: usize,
    /// Speed ratio to the movement peak below which the player counts as decelerating.
    pub decel_ratio: f32,
    pub stop_threshold_px: f32,
    pub hold_frames: usize,
    pub extension_frames: usize,
    pub exposure_opponents: usize,
    pub retention_events: usize,
    pub retention_horizon_secs: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            lookback_frames: 4,
            decel_ratio: 0.5,
            stop_threshold_px: 0.75,
            hold_frames: 6,
            extension_frames: 20,
            exposure_opponents: 2,
            retention_events: 512,
            retention_horizon_secs: 120.0,
        }
    }
}

impl BehaviorConfig {
    pub fn retention_horizon(&self) -> Duration {
        seconds_to_duration(self.retention_horizon_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillWeights {
    pub mechanics: f32,
    pub positioning: f32,
    pub game_sense: f32,
}

impl Default for SkillWeights {
    fn default() -> Self {
        Self {
            mechanics: 0.4,
            positioning: 0.35,
            game_sense: 0.25,
        }
    }
}

impl SkillWeights {
    pub fn sum(&self) -> f32 {
        self.mechanics + self.positioning + self.game_sense
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    pub decay: f32,
    pub prior: f32,
    pub event_delta: f32,
    pub weights: SkillWeights,
    pub intermediate_threshold: f32,
    pub advanced_threshold: f32,
    /// Categories below this make it into the training plan.
    pub plan_threshold: f32,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            decay: 0.1,
            prior: 0.5,
            event_delta: 0.02,
            weights: SkillWeights::default(),
            intermediate_threshold: 0.6,
            advanced_threshold: 0.8,
            plan_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachingConfig {
    pub max_tips_per_session: usize,
    pub default_cooldown_secs: f64,
    /// Per-rule cooldown overrides keyed by rule id.
    pub rule_cooldowns: IndexMap<String, f64>,
    pub accuracy_threshold: f32,
    pub placement_threshold: f32,
    pub movement_threshold: f32,
    pub stability_threshold: f32,
    pub game_sense_threshold: f32,
    pub threat_threshold: f32,
}

impl Default for CoachingConfig {
    fn default() -> Self {
        let rule_cooldowns = IndexMap::from([
            ("crosshair_placement".to_string(), 10.0),
            ("accuracy".to_string(), 10.0),
            ("game_sense".to_string(), 30.0),
        ]);
        Self {
            max_tips_per_session: 50,
            default_cooldown_secs: 5.0,
            rule_cooldowns,
            accuracy_threshold: 0.6,
            placement_threshold: 0.5,
            movement_threshold: 0.4,
            stability_threshold: 0.4,
            game_sense_threshold: 0.5,
            threat_threshold: 0.7,
        }
    }
}

impl CoachingConfig {
    pub fn cooldown_secs(&self, rule_id: &str) -> f64 {
        self.rule_cooldowns
            .get(rule_id)
            .copied()
            .unwrap_or(self.default_cooldown_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_duration_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 300.0,
        }
    }
}

impl SessionConfig {
    pub fn max_duration(&self) -> Duration {
        seconds_to_duration(self.max_duration_secs)
    }
}

/// Negative seconds clamp to zero, out-of-range values to `Duration::MAX`.
pub(crate) fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}

fn is_duration(seconds: f64) -> bool {
    seconds >= 0.0 && Duration::try_from_secs_f64(seconds).is_ok()
}

fn check_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0) {
        return Err(ConfigError::NonPositive { name });
    }
    Ok(())
}

fn check_cooldown(rule: &str, seconds: f64) -> Result<(), ConfigError> {
    if !is_duration(seconds) {
        return Err(ConfigError::InvalidCooldown {
            rule: rule.to_string(),
            seconds,
        });
    }
    Ok(())
}

impl Configuration {
    /// Validate configuration values. Any fault here keeps a session from starting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capture = &self.capture;
        if !(capture.target_fps > 0.0) || !capture.target_fps.is_finite() {
            return Err(ConfigError::InvalidFrameRate(capture.target_fps));
        }
        if capture.queue_capacity == 0 {
            return Err(ConfigError::EmptyQueue);
        }

        let detection = &self.detection;
        if detection.reticle.colors.is_empty() {
            return Err(ConfigError::EmptySignature("reticle"));
        }
        if detection.opponents.signature.is_empty() {
            return Err(ConfigError::EmptySignature("opponents"));
        }
        check_unit("detection.opponents.min_confidence", detection.opponents.min_confidence)?;
        check_unit("detection.fire_indicator.min_fill", detection.fire_indicator.min_fill)?;
        for (i, fraction) in detection.fire_indicator.region.iter().enumerate() {
            check_unit(&format!("detection.fire_indicator.region[{i}]"), *fraction)?;
        }
        check_unit("detection.reticle.anchor.x", detection.reticle.anchor.0)?;
        check_unit("detection.reticle.anchor.y", detection.reticle.anchor.1)?;
        if detection.motion.downsample == 0 {
            return Err(ConfigError::NonPositive {
                name: "detection.motion.downsample",
            });
        }
        if detection.motion.point_spacing == 0 {
            return Err(ConfigError::NonPositive {
                name: "detection.motion.point_spacing",
            });
        }

        let analysis = &self.analysis;
        if analysis.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if analysis.min_samples > analysis.window_size {
            return Err(ConfigError::MinSamplesExceedWindow {
                min_samples: analysis.min_samples,
                window_size: analysis.window_size,
            });
        }
        check_unit("analysis.head_fraction", analysis.head_fraction)?;
        check_unit("analysis.default_head_line", analysis.default_head_line)?;
        check_unit("analysis.fire_penalty_weight", analysis.fire_penalty_weight)?;
        check_positive("analysis.placement_tolerance_px", analysis.placement_tolerance_px)?;
        check_positive("analysis.strafe_tolerance_px", analysis.strafe_tolerance_px)?;
        check_positive("analysis.jitter_scale_px", analysis.jitter_scale_px)?;
        check_positive("analysis.threat_radius_px", analysis.threat_radius_px)?;
        check_positive("analysis.threat_saturation", analysis.threat_saturation)?;
        check_positive("analysis.awareness_radius_px", analysis.awareness_radius_px)?;

        let behavior = &self.behavior;
        check_unit("behavior.decel_ratio", behavior.decel_ratio)?;
        if behavior.lookback_frames == 0 {
            return Err(ConfigError::NonPositive {
                name: "behavior.lookback_frames",
            });
        }
        if behavior.retention_events == 0 {
            return Err(ConfigError::NonPositive {
                name: "behavior.retention_events",
            });
        }
        let horizon = behavior.retention_horizon_secs;
        if !(horizon > 0.0) || !is_duration(horizon) {
            return Err(ConfigError::InvalidRetentionHorizon(horizon));
        }

        let skill = &self.skill;
        if !(skill.decay > 0.0 && skill.decay <= 1.0) {
            return Err(ConfigError::InvalidDecay(skill.decay));
        }
        check_unit("skill.prior", skill.prior)?;
        check_unit("skill.event_delta", skill.event_delta)?;
        check_unit("skill.intermediate_threshold", skill.intermediate_threshold)?;
        check_unit("skill.advanced_threshold", skill.advanced_threshold)?;
        check_unit("skill.plan_threshold", skill.plan_threshold)?;
        for (name, value) in [
            ("mechanics", skill.weights.mechanics),
            ("positioning", skill.weights.positioning),
            ("game_sense", skill.weights.game_sense),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let weight_sum = skill.weights.sum();
        if (weight_sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::WeightsNotNormalized(weight_sum));
        }

        let coaching = &self.coaching;
        check_cooldown("default", coaching.default_cooldown_secs)?;
        for (rule, seconds) in &coaching.rule_cooldowns {
            check_cooldown(rule, *seconds)?;
        }
        check_unit("coaching.accuracy_threshold", coaching.accuracy_threshold)?;
        check_unit("coaching.placement_threshold", coaching.placement_threshold)?;
        check_unit("coaching.movement_threshold", coaching.movement_threshold)?;
        check_unit("coaching.stability_threshold", coaching.stability_threshold)?;
        check_unit("coaching.game_sense_threshold", coaching.game_sense_threshold)?;
        check_unit("coaching.threat_threshold", coaching.threat_threshold)?;

        let max_duration = self.session.max_duration_secs;
        if !(max_duration > 0.0) || !is_duration(max_duration) {
            return Err(ConfigError::InvalidSessionDuration(max_duration));
        }

        Ok(())
    }

    pub fn with_target_fps(mut self, target_fps: f32) -> Self {
        self.capture.target_fps = target_fps;
        self
    }

    pub fn with_rule_cooldown(mut self, rule_id: impl Into<String>, seconds: f64) -> Self {
        self.coaching.rule_cooldowns.insert(rule_id.into(), seconds);
        self
    }

    pub fn with_session_duration(mut self, seconds: f64) -> Self {
        self.session.max_duration_secs = seconds;
        self
    }
}
