//! Frame timing for the render loop.

use std::time::{Duration, Instant};

/// Interval between FPS reports.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Per-frame clock: delta timing plus a once-per-second FPS report.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_tick: Instant,
    frames_since_report: u32,
    last_report: Instant,
}

impl FrameClock {
    /// Create a new clock, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            frames_since_report: 0,
            last_report: now,
        }
    }

    /// Total elapsed time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Mark the end of a frame and return the time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        self.frames_since_report += 1;
        delta
    }

    /// Average frames per second since the last report, if a report is due.
    ///
    /// Returns `Some` at most once per second; call after [`tick`](Self::tick).
    pub fn fps_report(&mut self) -> Option<f64> {
        let since_report = self.last_report.elapsed();
        if since_report < REPORT_INTERVAL || self.frames_since_report == 0 {
            return None;
        }
        let fps = self.frames_since_report as f64 / since_report.as_secs_f64();
        self.frames_since_report = 0;
        self.last_report = Instant::now();
        Some(fps)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
