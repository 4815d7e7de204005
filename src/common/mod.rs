pub mod frame;
pub mod geometry;
pub mod ring_buffer;
pub mod synthetic;

pub use frame::Frame;
pub use geometry::{BoundingBox, MotionVector, Point};
pub use ring_buffer::RingBuffer;
