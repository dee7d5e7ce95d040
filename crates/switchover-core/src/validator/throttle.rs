//! Sliding-window admission for scan iterations.

use std::time::{Duration, Instant};

use crate::queue::Queue;

/// Admits at most `max_events` iterations per `window`.
///
/// Admission timestamps live in a FIFO; anything older than the window is
/// pruned on the way in.
pub struct SlideWindow {
    window: Duration,
    max_events: usize,
    admitted: Queue<Instant>,
}

impl SlideWindow {
    pub fn new(window: Duration, max_events: usize) -> Self {
        Self { window, max_events: max_events.max(1), admitted: Queue::new() }
    }

    /// Admit one iteration now, or say how long to wait before retrying.
    pub fn admit(&self) -> Option<Duration> {
        self.admit_at(Instant::now())
    }

    fn admit_at(&self, now: Instant) -> Option<Duration> {
        while let Some(oldest) = self.admitted.peek() {
            if now.duration_since(oldest) >= self.window {
                self.admitted.dequeue();
            } else {
                break;
            }
        }
        if self.admitted.len() < self.max_events {
            self.admitted.enqueue(now);
            return None;
        }
        let oldest = self.admitted.peek()?;
        Some(self.window.saturating_sub(now.duration_since(oldest)))
    }
}
