use crate::common::{frame::Frame, ring_buffer::RingBuffer};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting the oldest waiting frame.
    DroppedOldest { sequence: u64 },
    Closed,
}

/// Bounded single-consumer frame queue.
///
/// `push` never blocks the producer: a full queue drops its oldest frame.
pub struct FrameQueue {
    frames: Mutex<RingBuffer<Frame>>,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(RingBuffer::new(capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push(&self, frame: Frame) -> PushOutcome {
        if self.is_closed() {
            return PushOutcome::Closed;
        }
        let evicted = self
            .frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
        self.notify.notify_one();

        match evicted {
            Some(old) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Frame queue full, dropped frame {}", old.sequence());
                PushOutcome::DroppedOldest {
                    sequence: old.sequence(),
                }
            }
            None => PushOutcome::Queued,
        }
    }

    pub fn try_pop(&self) -> Option<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Next frame, waiting if the queue is empty. `None` once closed and drained.
    pub async fn pop(&self) -> Option<Frame> {
        loop {
            let notified = self.notify.notified();
            if let Some(frame) = self.try_pop() {
                return Some(frame);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::Arc;
    use std::time::Duration;

    fn frame(sequence: u64) -> Frame {
        Frame::new(RgbImage::new(2, 2), Duration::from_millis(sequence * 33), sequence)
    }

    #[test]
    fn drops_oldest_when_full() {
        let queue = FrameQueue::new(2);
        assert_eq!(queue.push(frame(1)), PushOutcome::Queued);
        assert_eq!(queue.push(frame(2)), PushOutcome::Queued);
        assert_eq!(queue.push(frame(3)), PushOutcome::DroppedOldest { sequence: 1 });
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.try_pop().map(|f| f.sequence()), Some(2));
        assert_eq!(queue.try_pop().map(|f| f.sequence()), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn closed_queue_refuses_frames() {
        let queue = FrameQueue::new(2);
        queue.close();
        assert_eq!(queue.push(frame(1)), PushOutcome::Closed);
    }

    #[tokio::test]
    async fn pop_waits_for_producer() {
        let queue = Arc::new(FrameQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await.map(|f| f.sequence()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push(frame(7));
        assert_eq!(consumer.await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn close_drains_then_ends() {
        let queue = FrameQueue::new(4);
        queue.push(frame(1));
        queue.close();
        assert_eq!(queue.pop().await.map(|f| f.sequence()), Some(1));
        assert!(queue.pop().await.is_none());
    }

    #[tokio::test]
    async fn close_wakes_waiting_consumer() {
        let queue = Arc::new(FrameQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await.is_none() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close();
        assert!(consumer.await.unwrap());
    }
}
