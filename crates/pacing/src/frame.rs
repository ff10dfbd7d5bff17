//! Round-robin frame pacing.
//!
//! [`FramePacer`] layers a slot table over the [`FenceTracker`]: one slot
//! per frame in flight, each remembering the completion value its last use
//! must reach before the producer may touch that slot's resources again.
//! The per-iteration order is strict: wait for the slot, record into it,
//! signal, store the new target. The pacer enforces it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use framepacer_engine::{EngineResult, TimelineQueue};

use crate::tracker::FenceTracker;

/// How long the destructor waits for outstanding slot work before giving
/// up with a diagnostic. Explicit [`flush`](FramePacer::flush) remains the
/// strict teardown path.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames-in-flight pacer over an execution queue.
///
/// The slot count is fixed at construction (typically 2 or 3) and the slot
/// index advances round-robin. Each slot's stored target is the exact value
/// signaled at the end of its previous use; targets are never conflated
/// across slots, so a wait for slot reuse never over- or under-synchronizes.
///
/// # Thread Safety
///
/// Not thread-safe: drive it from the single producer thread.
pub struct FramePacer<Q: TimelineQueue> {
    tracker: FenceTracker<Q>,
    /// Per-slot reuse target; 0 means the slot has never been signaled.
    slots: Vec<u64>,
    /// Slot the producer is currently recording into.
    current: usize,
}

impl<Q: TimelineQueue> FramePacer<Q> {
    /// Creates a pacer with `frames_in_flight` slots over the given queue.
    ///
    /// # Panics
    ///
    /// Panics if `frames_in_flight` is 0.
    pub fn new(queue: Arc<Q>, frames_in_flight: usize) -> Self {
        assert!(
            frames_in_flight >= 1,
            "at least one frame-in-flight slot is required"
        );

        info!("Frame pacer created with {} frames in flight", frames_in_flight);

        Self {
            tracker: FenceTracker::new(queue),
            slots: vec![0; frames_in_flight],
            current: 0,
        }
    }

    /// Returns the number of frame-in-flight slots.
    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot the producer is currently recording into.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Returns the underlying tracker.
    #[inline]
    pub fn tracker(&self) -> &FenceTracker<Q> {
        &self.tracker
    }

    /// Returns the underlying tracker for callers that drive their own
    /// signals around [`retire_slot`](Self::retire_slot).
    #[inline]
    pub fn tracker_mut(&mut self) -> &mut FenceTracker<Q> {
        &mut self.tracker
    }

    /// Waits until the current slot's previous work has drained and returns
    /// the slot index, ready for the producer to record into.
    ///
    /// On the first lap through the slots there is nothing to wait for.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`](framepacer_engine::EngineError)
    /// if the queue is gone.
    pub fn begin_frame(&mut self) -> EngineResult<usize> {
        let pending = self.slots[self.current];
        if pending != 0 {
            self.tracker.wait_for_value(pending)?;
        }
        Ok(self.current)
    }

    /// Like [`begin_frame`](Self::begin_frame), but bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Timeout`](framepacer_engine::EngineError) if
    /// the slot is still busy when the timeout expires; the pacer state is
    /// unchanged and the call can be retried.
    pub fn begin_frame_timeout(&mut self, timeout: Duration) -> EngineResult<usize> {
        let pending = self.slots[self.current];
        if pending != 0 {
            self.tracker.wait_for_value_timeout(pending, timeout)?;
        }
        Ok(self.current)
    }

    /// Signals the queue for the work recorded this frame, stores the value
    /// as the current slot's reuse target, and advances to the next slot.
    ///
    /// Returns the signaled value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`](framepacer_engine::EngineError)
    /// if the queue is gone.
    pub fn end_frame(&mut self) -> EngineResult<u64> {
        let value = self.tracker.signal()?;
        let retired = self.retire_slot(self.current, value)?;
        debug!(
            "Slot {} signaled at value {} (retired target {})",
            self.current, value, retired
        );
        self.current = (self.current + 1) % self.slots.len();
        Ok(value)
    }

    /// Waits out a slot's previously recorded target, records `new_target`
    /// as its next one, and returns the old value for diagnostics.
    ///
    /// This is the composite the loop runs every iteration; it is public
    /// for callers that perform their own [`signal`](FenceTracker::signal)
    /// at the end of each slot's use. The wait is free when
    /// [`begin_frame`](Self::begin_frame) already drained the slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not the current slot: retiring out of
    /// round-robin order is a programming error, not a runtime condition.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`](framepacer_engine::EngineError)
    /// if the queue is gone.
    pub fn retire_slot(&mut self, slot: usize, new_target: u64) -> EngineResult<u64> {
        assert_eq!(
            slot, self.current,
            "slot {slot} retired out of round-robin order"
        );

        let previous = self.slots[slot];
        if previous != 0 {
            self.tracker.wait_for_value(previous)?;
        }
        self.slots[slot] = new_target;
        Ok(previous)
    }

    /// Signals and waits until the queue has drained everything enqueued so
    /// far. Call before releasing resources the consumer may still touch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`](framepacer_engine::EngineError)
    /// if the queue is gone.
    pub fn flush(&mut self) -> EngineResult<u64> {
        self.tracker.flush()
    }
}

impl<Q: TimelineQueue> Drop for FramePacer<Q> {
    fn drop(&mut self) {
        // All outstanding slot targets are covered by the last signaled
        // value, so waiting on it drains every slot without issuing a new
        // signal. Bounded: a stalled or lost queue must not hang teardown.
        let last = self.tracker.last_signaled_value();
        if last == 0 {
            return;
        }
        if let Err(e) = self.tracker.wait_for_value_timeout(last, DRAIN_TIMEOUT) {
            error!("Failed to drain frame pacer during drop: {e}");
        }
    }
}
