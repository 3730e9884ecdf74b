//! Time management utilities

use std::time::{Duration, Instant};

/// Accumulated game time, advanced explicitly once per frame
#[derive(Debug, Clone, Default)]
pub struct GameClock {
    total_time: f64,
    last_delta: f32,
    frame_count: u64,
}

impl GameClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame of `delta_time` seconds
    pub fn advance(&mut self, delta_time: f32) {
        self.last_delta = delta_time;
        self.total_time += f64::from(delta_time);
        self.frame_count += 1;
    }

    /// Total game time in seconds
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Delta of the most recent frame
    pub fn delta_time(&self) -> f32 {
        self.last_delta
    }

    /// Number of frames begun so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed wall-clock time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulates_frames() {
        let mut clock = GameClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.frame_count(), 2);
        assert!((clock.total_time() - 0.75).abs() < 1e-9);
        assert_eq!(clock.delta_time(), 0.25);
    }
}
