//! Execution-engine boundary for the frame pacer.
//!
//! This crate defines the narrow interface the pacing core needs from an
//! asynchronous execution queue, plus the host-side pieces around it:
//! - Engine error taxonomy (fatal device loss, recoverable timeouts)
//! - The reusable notification primitive for blocking waits
//! - The [`TimelineQueue`] capability trait
//! - A software queue implementation for driving the loop without hardware

mod error;

pub mod event;
pub mod queue;
pub mod software;

pub use error::{EngineError, EngineResult};
pub use event::FenceEvent;
pub use queue::TimelineQueue;
pub use software::SoftwareQueue;
