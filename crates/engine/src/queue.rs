//! Execution-queue capability surface.

use crate::error::EngineResult;
use crate::event::FenceEvent;

/// The capability an asynchronous execution queue exposes for completion
/// tracking.
///
/// An implementation models a consumer that executes enqueued work at its
/// own pace and reports progress through a single monotonic completion
/// value. The contract:
///
/// - `enqueue_signal(value)` is asynchronous fire-and-forget: the queue
///   reports `value` only after everything enqueued before the call has
///   finished. Signals are honored in FIFO order relative to other work
///   from the same producer thread.
/// - `completed_value()` is synchronous and non-blocking, safe to call from
///   the producer thread at any time; returned values never decrease.
/// - `register_wait(value, event)` arranges for `event` to be set once the
///   completed value reaches `value`. If it already has, the event is set
///   before the call returns. A queue that becomes lost must set every
///   registered event so no waiter hangs.
///
/// All three surface [`EngineError::DeviceLost`](crate::EngineError) once
/// the queue can make no further progress.
pub trait TimelineQueue {
    /// Asks the queue to report `value` after all previously enqueued work
    /// completes.
    fn enqueue_signal(&self, value: u64) -> EngineResult<()>;

    /// Returns the most recent value the queue has reported.
    fn completed_value(&self) -> EngineResult<u64>;

    /// Arranges for `event` to be set once the completed value reaches
    /// `value`.
    fn register_wait(&self, value: u64, event: &FenceEvent) -> EngineResult<()>;
}
