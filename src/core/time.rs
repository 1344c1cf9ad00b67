//! Frame timing and the fixed frame budget

use std::time::{Duration, Instant};

/// Tracks frame boundaries and sleeps to hold a target frame rate.
#[derive(Debug, Clone)]
pub struct Time {
    /// Wall-clock budget for one frame (`None` = unlimited)
    budget: Option<Duration>,
    /// Start of the current frame
    frame_start: Instant,
    /// Duration of the previous full frame, including sleep
    delta: Duration,
    /// Number of frames started
    frame: u64,
}

impl Time {
    /// Create a clock for the given target FPS (`0` disables the budget)
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        Self {
            budget: Self::budget_for(target_fps),
            frame_start: Instant::now(),
            delta: Duration::ZERO,
            frame: 0,
        }
    }

    /// Frame budget for a target FPS
    #[must_use]
    pub fn budget_for(target_fps: u32) -> Option<Duration> {
        (target_fps > 0).then(|| Duration::from_secs(1) / target_fps)
    }

    /// Mark the start of a new frame
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        if self.frame > 0 {
            self.delta = now - self.frame_start;
        }
        self.frame_start = now;
        self.frame += 1;
    }

    /// Time spent in the current frame so far
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.frame_start.elapsed()
    }

    /// Time left in the budget for the current frame
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.budget
            .map_or(Duration::ZERO, |budget| budget.saturating_sub(self.elapsed()))
    }

    /// Sleep until the frame budget is met. Returns the time slept.
    pub fn sleep_remaining(&self) -> Duration {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        remaining
    }

    /// Whether the current frame has already exceeded its budget
    #[must_use]
    pub fn over_budget(&self) -> bool {
        self.budget.is_some_and(|budget| self.elapsed() > budget)
    }

    /// Frame budget
    #[must_use]
    pub const fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Duration of the previous frame
    #[must_use]
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    /// Number of frames started
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(30)
    }
}
