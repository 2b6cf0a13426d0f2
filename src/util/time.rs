//! Time utilities for game simulation

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Upper bound on a single simulation step. Frame hitches longer than this
/// are clamped so positions never jump across large distances in one tick.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Source of monotonic session time
pub trait Clock {
    /// Time elapsed since the clock's epoch
    fn now(&self) -> Duration;
}

/// Wall clock anchored at construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Manually advanced clock. Clones share the same time source, so a test
/// (or the fast-forward driver) can keep one handle and give another to the
/// controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Computes per-frame delta time from successive frame timestamps
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_frame: Option<Duration>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the capped step in seconds.
    /// The first frame after construction or `restart` yields zero.
    pub fn step(&mut self, now: Duration) -> f32 {
        let delta = match self.last_frame {
            Some(last) => now.saturating_sub(last).min(MAX_FRAME_DELTA),
            None => Duration::ZERO,
        };
        self.last_frame = Some(now);
        delta.as_secs_f32()
    }

    /// Forget the previous frame (used when simulation resumes)
    pub fn restart(&mut self) {
        self.last_frame = None;
    }
}

/// Elapsed time between two instants on the same clock, clamped at zero
pub fn elapsed_between(earlier: Duration, later: Duration) -> Duration {
    later.saturating_sub(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timer_first_frame_is_zero() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.step(Duration::from_millis(500)), 0.0);
    }

    #[test]
    fn test_frame_timer_caps_hitches() {
        let mut timer = FrameTimer::new();
        timer.step(Duration::from_millis(0));
        let dt = timer.step(Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);

        let dt = timer.step(Duration::from_millis(1016));
        assert!((dt - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_frame_timer_restart() {
        let mut timer = FrameTimer::new();
        timer.step(Duration::from_millis(0));
        timer.restart();
        assert_eq!(timer.step(Duration::from_secs(30)), 0.0);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance_ms(250);
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_elapsed_between_never_negative() {
        let a = Duration::from_secs(5);
        let b = Duration::from_secs(3);
        assert_eq!(elapsed_between(a, b), Duration::ZERO);
    }
}
