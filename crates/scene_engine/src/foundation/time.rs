//! Frame timing for window backends that run on wall-clock time

use std::time::{Duration, Instant};

/// Longest delta handed to a frame; a stall (debugger, window drag) is
/// reported as this instead of one huge step.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Measures the wall-clock time between frames
#[derive(Debug, Clone)]
pub struct Timer {
    started: Instant,
    last_tick: Instant,
    delta: Duration,
    max_delta: Duration,
    ticks: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Timer starting now, clamped to [`MAX_FRAME_DELTA`]
    pub fn new() -> Self {
        Self::with_max_delta(MAX_FRAME_DELTA)
    }

    /// Timer with a custom delta clamp
    pub fn with_max_delta(max_delta: Duration) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_tick: now,
            delta: Duration::ZERO,
            max_delta,
            ticks: 0,
        }
    }

    /// Mark the start of a frame
    pub fn update(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_tick).min(self.max_delta);
        self.last_tick = now;
        self.ticks += 1;
    }

    /// Seconds between the last two ticks, clamped
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Wall-clock seconds since the timer was created
    pub fn total_time(&self) -> f32 {
        self.last_tick.saturating_duration_since(self.started).as_secs_f32()
    }

    /// Ticks so far
    pub fn frame_count(&self) -> u64 {
        self.ticks
    }

    /// Average ticks per second
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        let total = self.total_time();
        if total > 0.0 {
            self.ticks as f32 / total
        } else {
            0.0
        }
    }
}
