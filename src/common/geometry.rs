use serde::{Deserialize, Serialize};

/// Sub-pixel image coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Rectangular region of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region of `half_width`/`half_height` around `center`, clipped to the image.
    pub fn around(center: (u32, u32), half_width: u32, half_height: u32, bounds: (u32, u32)) -> Self {
        let x0 = center.0.saturating_sub(half_width);
        let y0 = center.1.saturating_sub(half_height);
        let x1 = center.0.saturating_add(half_width).saturating_add(1).min(bounds.0);
        let y1 = center.1.saturating_add(half_height).saturating_add(1).min(bounds.1);
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Region expressed as fractions of the image size, clipped to the image.
    pub fn from_fractions(fractions: [f32; 4], bounds: (u32, u32)) -> Self {
        let to_px = |fraction: f32, extent: u32| {
            ((fraction.clamp(0.0, 1.0) * extent as f32).round() as u32).min(extent)
        };
        let x = to_px(fractions[0], bounds.0);
        let y = to_px(fractions[1], bounds.1);
        let width = to_px(fractions[2], bounds.0).min(bounds.0 - x);
        let height = to_px(fractions[3], bounds.1).min(bounds.1 - y);
        Self::new(x, y, width, height)
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x as f32
            && point.x < (self.x + self.width) as f32
            && point.y >= self.y as f32
            && point.y < (self.y + self.height) as f32
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Vertical interval of the head: the top `fraction` of the box.
    pub fn head_band(&self, fraction: f32) -> (f32, f32) {
        let top = self.y as f32;
        (top, top + self.height as f32 * fraction.clamp(0.0, 1.0))
    }
}

/// Dominant frame-to-frame displacement of scene content, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub dx: f32,
    pub dy: f32,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    pub fn magnitude(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Unit direction, or `None` for a zero vector.
    pub fn direction(&self) -> Option<(f32, f32)> {
        let magnitude = self.magnitude();
        (magnitude > f32::EPSILON).then(|| (self.dx / magnitude, self.dy / magnitude))
    }
}

/// Distance from `value` to the closed interval `[low, high]`.
pub fn distance_outside(value: f32, (low, high): (f32, f32)) -> f32 {
    if value < low {
        low - value
    } else if value > high {
        value - high
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn around_clips_to_image_bounds() {
        let region = BoundingBox::around((5, 5), 10, 3, (100, 100));
        assert_eq!(region, BoundingBox::new(0, 2, 16, 7));
    }

    #[test]
    fn from_fractions_stays_inside_image() {
        let region = BoundingBox::from_fractions([0.9, 0.9, 0.5, 0.5], (200, 100));
        assert_eq!(region, BoundingBox::new(180, 90, 20, 10));
    }

    #[test]
    fn head_band_is_top_of_box() {
        let bbox = BoundingBox::new(10, 100, 40, 100);
        assert_eq!(bbox.head_band(0.2), (100.0, 120.0));
        assert!(bbox.contains_point(Point::new(10.0, 100.0)));
        assert!(!bbox.contains_point(Point::new(50.0, 100.0)));
    }

    #[test]
    fn distance_outside_interval() {
        assert_eq!(distance_outside(5.0, (10.0, 20.0)), 5.0);
        assert_eq!(distance_outside(15.0, (10.0, 20.0)), 0.0);
        assert_eq!(distance_outside(26.0, (10.0, 20.0)), 6.0);
    }

    #[test]
    fn zero_motion_has_no_direction() {
        assert!(MotionVector::ZERO.direction().is_none());
        let (x, y) = MotionVector::new(3.0, 4.0).direction().unwrap();
        assert!((x - 0.6).abs() < 1e-6 && (y - 0.8).abs() < 1e-6);
    }
}
