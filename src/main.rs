use fps_coach::common::geometry::BoundingBox;
use fps_coach::common::synthetic::SyntheticScene;
use fps_coach::pipeline::{PushOutcome, TracingSink};
use fps_coach::{AppError, Configuration, CoordinatorBuilder};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

const SETTINGS_FILE: &str = "coach";
const ENV_PREFIX: &str = "COACH";
const DEMO_SECONDS: u64 = 10;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

/// Defaults, overlaid by an optional settings file and then by
/// `COACH__SECTION__KEY` environment variables.
fn load_configuration(path: &str) -> Result<Configuration, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// Synthetic round: an opponent strafes across the screen while the
/// player tracks it with a jittery crosshair and fires now and then.
fn scene_for(scene: &mut SyntheticScene, sequence: u64, rng: &mut impl Rng) {
    let (width, height) = scene.dimensions();
    let sweep = (sequence % 120) as f32 / 120.0;
    let opponent_x = (width as f32 * (0.2 + 0.5 * sweep)) as u32;
    let opponent = BoundingBox {
        x: opponent_x,
        y: height / 3,
        width: 40,
        height: 100,
    };
    let aim_x = (opponent.center().x + rng.random_range(-30.0f32..30.0)).clamp(0.0, (width - 1) as f32);
    let aim_y = (opponent.y as f32 + 15.0 + rng.random_range(-40.0f32..60.0)).clamp(0.0, (height - 1) as f32);

    scene.set_opponents(vec![opponent]);
    scene.set_crosshair(Some((aim_x as u32, aim_y as u32)));
    scene.set_camera(((sequence as i32) * 2, 0));
    scene.set_firing(rng.random_bool(0.05));
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let mut configuration = load_configuration(&settings_path)?;
    let fps = configuration.capture.target_fps;
    // the synthetic reticle follows the opponent around the screen
    configuration.detection.reticle.search_half_height = 240;
    configuration.detection.reticle.search_half_width = 320;

    let coordinator = CoordinatorBuilder::new(configuration)
        .sink(Arc::new(TracingSink))
        .build()?;
    info!("Session {} running", coordinator.session_id());

    let mut scene = SyntheticScene::new(640, 480);
    let mut rng = rand::rng();
    let mut ticker = tokio::time::interval(Duration::from_secs_f32(1.0 / fps));
    let total_frames = (DEMO_SECONDS as f32 * fps) as u64;
    for sequence in 1..=total_frames {
        ticker.tick().await;
        scene_for(&mut scene, sequence, &mut rng);
        let timestamp = Duration::from_secs_f32(sequence as f32 / fps);
        match coordinator.push(scene.render(timestamp, sequence)) {
            PushOutcome::Closed => break,
            PushOutcome::DroppedOldest { sequence } => warn!("Dropped frame {}", sequence),
            PushOutcome::Queued => {}
        }
    }

    let report = coordinator.finish().await?;
    info!(
        "Session finished: {} frames, level {:?}, {} tips",
        report.frames_processed,
        report.skill_level,
        report.tip_history.len()
    );
    for area in &report.training_plan.focus_areas {
        info!("Focus on {}: {:.2} -> {:.2}", area.category, area.score, area.target);
    }
    Ok(())
}
