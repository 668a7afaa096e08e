//! High-resolution timers for frame timing.

use std::time::{Duration, Instant};

/// High-resolution timer for measuring elapsed time.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Get the total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get the time elapsed since the last call to `tick()`.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }

    /// Get the delta time in seconds since the last tick.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }

    /// Reset the timer to the current time.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_tick = now;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential moving average of frame durations.
///
/// The first sample seeds the estimate directly; every later sample moves the
/// estimate toward itself by `smoothing` (0 < smoothing <= 1).
#[derive(Debug, Clone)]
pub struct FrameTimeEstimator {
    smoothing: f32,
    estimate: Option<f32>,
}

impl FrameTimeEstimator {
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            estimate: None,
        }
    }

    /// Feed one frame duration in seconds and return the updated estimate.
    pub fn add_sample(&mut self, sample_secs: f32) -> f32 {
        let next = match self.estimate {
            None => sample_secs,
            Some(current) => current + self.smoothing * (sample_secs - current),
        };
        self.estimate = Some(next);
        next
    }

    /// Smoothed frame time in seconds, zero before the first sample.
    pub fn frame_time_secs(&self) -> f32 {
        self.estimate.unwrap_or(0.0)
    }

    /// Frames per second derived from the smoothed frame time.
    pub fn fps(&self) -> f32 {
        match self.estimate {
            Some(secs) if secs > 0.0 => 1.0 / secs,
            _ => 0.0,
        }
    }
}
