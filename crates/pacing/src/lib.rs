//! Frame pacing core.
//!
//! This crate coordinates a CPU producer and an asynchronous execution
//! queue so a small number of frames can be in flight at once:
//! - [`FenceTracker`]: monotonic counter, exact-value waits, flush
//! - [`FramePacer`]: round-robin slot table driving the per-frame
//!   wait/record/signal cycle

pub mod frame;
pub mod tracker;

pub use frame::FramePacer;
pub use tracker::FenceTracker;

#[cfg(test)]
pub(crate) mod testing;

/// Default number of frame-in-flight slots (triple buffering).
pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 3;
