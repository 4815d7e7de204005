use crate::common::geometry::MotionVector;
use crate::config::MotionConfig;
use image::{imageops, GrayImage, RgbImage};

/// Downsampled grayscale copy of the last processed frame.
///
/// This is the only thing kept between frames; the source pixel buffer is not retained.
#[derive(Debug, Clone)]
pub struct MotionReference {
    pub sequence: u64,
    pub dimensions: (u32, u32),
    gray: GrayImage,
}

impl MotionReference {
    /// Whether a frame with `sequence` and `dimensions` directly continues this reference.
    pub fn continues_with(&self, sequence: u64, dimensions: (u32, u32)) -> bool {
        self.sequence.checked_add(1) == Some(sequence) && self.dimensions == dimensions
    }
}

/// Sparse block-matching tracker producing one dominant motion vector per frame pair.
pub struct MotionEstimator {
    config: MotionConfig,
}

impl MotionEstimator {
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }

    pub fn reference(&self, pixels: &RgbImage, sequence: u64) -> MotionReference {
        let gray = imageops::grayscale(pixels);
        let factor = self.config.downsample.max(1);
        let gray = if factor == 1 {
            gray
        } else {
            let (width, height) = gray.dimensions();
            imageops::resize(
                &gray,
                (width / factor).max(1),
                (height / factor).max(1),
                imageops::FilterType::Triangle,
            )
        };
        MotionReference {
            sequence,
            dimensions: pixels.dimensions(),
            gray,
        }
    }

    /// Dominant displacement of scene content from `previous` to `current`, in
    /// full-resolution pixels. Zero when too few points can be tracked.
    pub fn estimate(&self, previous: &MotionReference, current: &MotionReference) -> MotionVector {
        if previous.gray.dimensions() != current.gray.dimensions() {
            return MotionVector::ZERO;
        }

        let points = self.salient_points(&previous.gray);
        let mut dxs = Vec::with_capacity(points.len());
        let mut dys = Vec::with_capacity(points.len());
        for (x, y) in points {
            if let Some((dx, dy)) = self.track(&previous.gray, &current.gray, x, y) {
                dxs.push(dx as f32);
                dys.push(dy as f32);
            }
        }

        if dxs.len() < self.config.min_tracked.max(1) {
            return MotionVector::ZERO;
        }

        let factor = self.config.downsample.max(1) as f32;
        MotionVector::new(median(&mut dxs) * factor, median(&mut dys) * factor)
    }

    fn margin(&self) -> u32 {
        self.config.patch_radius + self.config.search_radius
    }

    fn salient_points(&self, gray: &GrayImage) -> Vec<(u32, u32)> {
        let (width, height) = gray.dimensions();
        let margin = self.margin();
        // the gradient reads one pixel past the patch
        if width <= 2 * margin + 1 || height <= 2 * margin + 1 {
            return Vec::new();
        }

        let spacing = self.config.point_spacing.max(1) as usize;
        let mut scored = Vec::new();
        for y in (margin..height - margin - 1).step_by(spacing) {
            for x in (margin..width - margin - 1).step_by(spacing) {
                let score = self.texture_score(gray, x, y);
                if score >= self.config.min_texture {
                    scored.push((score, x, y));
                }
            }
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.2.cmp(&b.2)).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.config.max_points)
            .map(|(_, x, y)| (x, y))
            .collect()
    }

    /// min(Σ|Ix|, Σ|Iy|) over the patch; high only where both directions have structure.
    fn texture_score(&self, gray: &GrayImage, x: u32, y: u32) -> f32 {
        let r = self.config.patch_radius;
        let (mut gx, mut gy) = (0u32, 0u32);
        for py in y - r..=y + r {
            for px in x - r..=x + r {
                let value = gray.get_pixel(px, py).0[0];
                gx += value.abs_diff(gray.get_pixel(px + 1, py).0[0]) as u32;
                gy += value.abs_diff(gray.get_pixel(px, py + 1).0[0]) as u32;
            }
        }
        gx.min(gy) as f32
    }

    fn patch_sad(&self, previous: &GrayImage, current: &GrayImage, x: u32, y: u32, cx: u32, cy: u32) -> u32 {
        let r = self.config.patch_radius;
        let mut sad = 0u32;
        for oy in 0..=2 * r {
            for ox in 0..=2 * r {
                let a = previous.get_pixel(x - r + ox, y - r + oy).0[0];
                let b = current.get_pixel(cx - r + ox, cy - r + oy).0[0];
                sad += a.abs_diff(b) as u32;
            }
        }
        sad
    }

    fn track(&self, previous: &GrayImage, current: &GrayImage, x: u32, y: u32) -> Option<(i32, i32)> {
        let search = self.config.search_radius as i32;
        let mut best: Option<(u32, i32, i32)> = None;
        for dy in -search..=search {
            for dx in -search..=search {
                let cx = (x as i32 + dx) as u32;
                let cy = (y as i32 + dy) as u32;
                let sad = self.patch_sad(previous, current, x, y, cx, cy);
                let better = match best {
                    None => true,
                    Some((best_sad, bdx, bdy)) => {
                        sad < best_sad || (sad == best_sad && dx.abs() + dy.abs() < bdx.abs() + bdy.abs())
                    }
                };
                if better {
                    best = Some((sad, dx, dy));
                }
            }
        }

        let side = 2 * self.config.patch_radius + 1;
        let (sad, dx, dy) = best?;
        let mean_error = sad as f32 / (side * side) as f32;
        (mean_error <= self.config.max_match_error).then_some((dx, dy))
    }
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
