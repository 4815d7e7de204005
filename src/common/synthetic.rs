use super::{frame::Frame, geometry::BoundingBox};
use crate::config::FireIndicatorConfig;
use image::{Rgb, RgbImage};
use std::time::Duration;

pub const OPPONENT_COLOR: Rgb<u8> = Rgb([220, 30, 30]);
pub const RETICLE_COLOR: Rgb<u8> = Rgb([40, 240, 40]);
pub const INDICATOR_COLOR: Rgb<u8> = Rgb([250, 250, 250]);

const TEXTURE_BLOCK: i32 = 8;
const RETICLE_ARM: i32 = 4;

/// Deterministic gameplay-like frame renderer.
///
/// The background is a blocky gray texture that scrolls with `camera`, so a
/// camera move shows up as scene motion; opponents, reticle and the fire
/// indicator are drawn in screen space on top of it.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    width: u32,
    height: u32,
    camera: (i32, i32),
    opponents: Vec<BoundingBox>,
    crosshair: Option<(u32, u32)>,
    weapon_fired: bool,
    fire_region: [f32; 4],
}

impl SyntheticScene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            camera: (0, 0),
            opponents: Vec::new(),
            crosshair: Some((width / 2, height / 2)),
            weapon_fired: false,
            fire_region: FireIndicatorConfig::default().region,
        }
    }

    pub fn with_camera(mut self, camera: (i32, i32)) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_opponent(mut self, bbox: BoundingBox) -> Self {
        self.opponents.push(bbox);
        self
    }

    pub fn with_crosshair(mut self, crosshair: Option<(u32, u32)>) -> Self {
        self.crosshair = crosshair;
        self
    }

    pub fn firing(mut self, weapon_fired: bool) -> Self {
        self.weapon_fired = weapon_fired;
        self
    }

    pub fn set_camera(&mut self, camera: (i32, i32)) {
        self.camera = camera;
    }

    pub fn set_opponents(&mut self, opponents: Vec<BoundingBox>) {
        self.opponents = opponents;
    }

    pub fn set_crosshair(&mut self, crosshair: Option<(u32, u32)>) {
        self.crosshair = crosshair;
    }

    pub fn set_firing(&mut self, weapon_fired: bool) {
        self.weapon_fired = weapon_fired;
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn render(&self, timestamp: Duration, sequence: u64) -> Frame {
        let mut pixels = RgbImage::from_fn(self.width, self.height, |x, y| {
            let value = texture_value(x as i32 + self.camera.0, y as i32 + self.camera.1);
            Rgb([value, value, value])
        });

        if self.weapon_fired {
            let region = BoundingBox::from_fractions(self.fire_region, (self.width, self.height));
            fill(&mut pixels, region, INDICATOR_COLOR);
        }
        for bbox in &self.opponents {
            fill(&mut pixels, *bbox, OPPONENT_COLOR);
        }
        if let Some((cx, cy)) = self.crosshair {
            for offset in -RETICLE_ARM..=RETICLE_ARM {
                put(&mut pixels, cx as i32 + offset, cy as i32, RETICLE_COLOR);
                put(&mut pixels, cx as i32, cy as i32 + offset, RETICLE_COLOR);
            }
        }

        Frame::new(pixels, timestamp, sequence)
    }
}

fn texture_value(x: i32, y: i32) -> u8 {
    let bx = x.div_euclid(TEXTURE_BLOCK) as u32;
    let by = y.div_euclid(TEXTURE_BLOCK) as u32;
    let mut hash = bx.wrapping_mul(73_856_093) ^ by.wrapping_mul(19_349_663);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0x5bd1_e995);
    hash ^= hash >> 15;
    30 + (hash % 80) as u8
}

fn fill(pixels: &mut RgbImage, bbox: BoundingBox, color: Rgb<u8>) {
    for y in bbox.y..bbox.y.saturating_add(bbox.height) {
        for x in bbox.x..bbox.x.saturating_add(bbox.width) {
            put(pixels, x as i32, y as i32, color);
        }
    }
}

fn put(pixels: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    if let Some(pixel) = pixels.get_pixel_mut_checked(x as u32, y as u32) {
        *pixel = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_shift_scrolls_background() {
        let a = SyntheticScene::new(64, 64).with_crosshair(None).render(Duration::ZERO, 0);
        let b = SyntheticScene::new(64, 64)
            .with_crosshair(None)
            .with_camera((4, 0))
            .render(Duration::ZERO, 1);
        assert_eq!(a.pixels().get_pixel(20, 10), b.pixels().get_pixel(16, 10));
    }

    #[test]
    fn draws_overlays_in_screen_space() {
        let frame = SyntheticScene::new(100, 100)
            .with_opponent(BoundingBox::new(10, 10, 5, 5))
            .firing(true)
            .render(Duration::ZERO, 0);
        assert_eq!(frame.pixels().get_pixel(12, 12), &OPPONENT_COLOR);
        assert_eq!(frame.pixels().get_pixel(50, 50), &RETICLE_COLOR);
        assert_eq!(frame.pixels().get_pixel(50, 93), &INDICATOR_COLOR);
    }

    #[test]
    fn background_stays_dark() {
        let frame = SyntheticScene::new(128, 128).with_crosshair(None).render(Duration::ZERO, 0);
        assert!(frame.pixels().pixels().all(|p| p.0[0] >= 30 && p.0[0] < 110));
    }
}
