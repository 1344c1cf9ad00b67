//! Frame statistics

use std::collections::VecDeque;
use std::time::Duration;

/// Rolling frame statistics for the run loop
#[derive(Debug)]
pub struct FrameStats {
    /// Work time (excluding the budget sleep) of recent frames
    frame_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Total frames recorded
    total_frames: u64,
    /// Frames whose work exceeded the frame budget
    overruns: u64,
}

impl FrameStats {
    /// Create a tracker keeping `max_samples` recent frames
    #[must_use]
    pub fn new(max_samples: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            total_frames: 0,
            overruns: 0,
        }
    }

    /// Record a frame's work time against its budget
    pub fn record_frame(&mut self, work: Duration, budget: Option<Duration>) {
        self.total_frames += 1;
        if budget.is_some_and(|b| work > b) {
            self.overruns += 1;
        }

        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(work);
    }

    /// Average work time in milliseconds
    #[must_use]
    pub fn avg_frame_time_ms(&self) -> f64 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        total.as_secs_f64() * 1000.0 / self.frame_times.len() as f64
    }

    /// Longest recent work time in milliseconds
    #[must_use]
    pub fn max_frame_time_ms(&self) -> f64 {
        self.frame_times
            .iter()
            .max()
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
    }

    /// Total frames recorded
    #[must_use]
    pub const fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames that ran over budget
    #[must_use]
    pub const fn overruns(&self) -> u64 {
        self.overruns
    }

    /// One-line summary for the log
    #[must_use]
    pub fn format_stats(&self) -> String {
        format!(
            "frames={} avg_ms={:.2} max_ms={:.2} overruns={}",
            self.total_frames,
            self.avg_frame_time_ms(),
            self.max_frame_time_ms(),
            self.overruns
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overruns_counted_against_budget() {
        let mut stats = FrameStats::new(4);
        let budget = Some(Duration::from_millis(33));

        stats.record_frame(Duration::from_millis(10), budget);
        stats.record_frame(Duration::from_millis(40), budget);
        stats.record_frame(Duration::from_millis(50), None);

        assert_eq!(stats.total_frames(), 3);
        assert_eq!(stats.overruns(), 1);
        assert!((stats.max_frame_time_ms() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_window_is_bounded() {
        let mut stats = FrameStats::new(2);
        stats.record_frame(Duration::from_millis(100), None);
        stats.record_frame(Duration::from_millis(10), None);
        stats.record_frame(Duration::from_millis(10), None);

        assert!((stats.avg_frame_time_ms() - 10.0).abs() < 1e-9);
    }
}
