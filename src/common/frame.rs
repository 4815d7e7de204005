use crate::error::FrameError;
use image::RgbImage;
use std::time::Duration;

/// One captured gameplay image plus its capture metadata.
///
/// `timestamp` is monotonic capture time measured from the frame source's own
/// epoch; `sequence` increases by one per captured frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
    timestamp: Duration,
    sequence: u64,
}

impl Frame {
    pub fn new(pixels: RgbImage, timestamp: Duration, sequence: u64) -> Self {
        Self {
            pixels,
            timestamp,
            sequence,
        }
    }

    /// Builds a frame from a tightly packed RGB8 buffer.
    pub fn from_rgb_bytes(
        width: u32,
        height: u32,
        bytes: Vec<u8>,
        timestamp: Duration,
        sequence: u64,
    ) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        let actual = bytes.len();
        let pixels = RgbImage::from_raw(width, height, bytes).ok_or(FrameError::BufferSize {
            width,
            height,
            expected,
            actual,
        })?;
        Ok(Self::new(pixels, timestamp, sequence))
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}
