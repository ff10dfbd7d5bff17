//! Completion tracking against an execution queue.
//!
//! [`FenceTracker`] owns the producer-side monotonic counter and the
//! notification primitive, and turns the queue's raw signal/query/wait
//! capability into exact-value waits:
//!
//! - [`signal`](FenceTracker::signal) hands out the next counter value and
//!   asks the queue to report it once prior work drains
//! - [`wait_for_value`](FenceTracker::wait_for_value) blocks the producer
//!   until a previously signaled value completes
//! - [`flush`](FenceTracker::flush) is signal-then-wait: full
//!   synchronization, no pipelining, for teardown and resource release
//!
//! The tracker assumes a single producer thread; the consumer side is only
//! reached through the [`TimelineQueue`] capability.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use framepacer_engine::{EngineError, EngineResult, FenceEvent, TimelineQueue};

/// Producer-side completion tracker.
///
/// Counter values start at 1 and increase by exactly 1 per
/// [`signal`](Self::signal); a fresh queue reports 0, so no signaled value
/// is ever completed before the queue reaches it.
pub struct FenceTracker<Q> {
    /// Shared handle to the consumer's capability. Non-owning in spirit:
    /// the tracker never drives the queue's lifetime.
    queue: Arc<Q>,
    /// Reusable notification handle, created once, used for every wait.
    event: FenceEvent,
    /// Next value `signal` will hand out.
    next_value: u64,
}

impl<Q: TimelineQueue> FenceTracker<Q> {
    /// Creates a tracker over the given queue.
    pub fn new(queue: Arc<Q>) -> Self {
        Self {
            queue,
            event: FenceEvent::new(),
            next_value: 1,
        }
    }

    /// Returns the queue this tracker signals and waits on.
    #[inline]
    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    /// The most recent value handed out by [`signal`](Self::signal), or 0 if
    /// nothing has been signaled yet.
    #[inline]
    pub fn last_signaled_value(&self) -> u64 {
        self.next_value - 1
    }

    /// The queue's current completion value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`] if the queue is gone.
    pub fn completed_value(&self) -> EngineResult<u64> {
        self.queue.completed_value()
    }

    /// Enqueues a completion report and returns the value it will carry.
    ///
    /// Fire-and-forget: the queue reports the value only after all work
    /// enqueued before this call has finished, which may take arbitrary
    /// time. The caller remembers the returned value as the reuse target
    /// for whatever resources this frame touched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`] if the queue is gone.
    pub fn signal(&mut self) -> EngineResult<u64> {
        let value = self.next_value;
        self.queue.enqueue_signal(value)?;
        self.next_value += 1;
        Ok(value)
    }

    /// Blocks until the queue completes `value`.
    ///
    /// Returns immediately, without touching the notification handle, if
    /// the value has already completed, so calling again for an
    /// already-satisfied target is free.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`] if the queue is gone; a lost
    /// queue wakes pending waits rather than hanging them.
    pub fn wait_for_value(&self, value: u64) -> EngineResult<()> {
        self.wait_inner(value, None)
    }

    /// Blocks until the queue completes `value` or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Timeout`] if the value is still outstanding
    /// when the timeout expires, [`EngineError::DeviceLost`] if the queue
    /// is gone.
    pub fn wait_for_value_timeout(&self, value: u64, timeout: Duration) -> EngineResult<()> {
        self.wait_inner(value, Some(timeout))
    }

    fn wait_inner(&self, value: u64, timeout: Option<Duration>) -> EngineResult<()> {
        debug_assert!(
            value < self.next_value,
            "wait target {value} was never signaled"
        );

        if self.queue.completed_value()? >= value {
            return Ok(());
        }

        self.queue.register_wait(value, &self.event)?;
        let deadline = timeout.map(|t| Instant::now() + t);
        debug!("Waiting for completion value {}", value);

        loop {
            let woke = match deadline {
                Some(deadline) => self.event.wait_until(deadline),
                None => {
                    self.event.wait();
                    true
                }
            };

            // Always compare against the exact requested target, never the
            // latest counter: several signals can be in flight at once, and
            // a wake may come from a stale registration left behind by an
            // earlier timed-out wait.
            if self.queue.completed_value()? >= value {
                return Ok(());
            }
            if let (false, Some(timeout)) = (woke, timeout) {
                return Err(EngineError::Timeout { value, timeout });
            }
        }
    }

    /// Signals and waits for the new value: everything enqueued before this
    /// call is complete when it returns.
    ///
    /// Strictly synchronizing (no pipelining benefit), so it belongs at
    /// resize/teardown boundaries, not in the steady-state loop. A fresh
    /// signal is always issued, even back to back; the second wait returns
    /// without blocking once the queue is drained.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`] if the queue is gone.
    pub fn flush(&mut self) -> EngineResult<u64> {
        let value = self.signal()?;
        self.wait_for_value(value)?;
        info!("Flushed at completion value {}", value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualQueue;
    use std::thread;

    #[test]
    fn test_signal_values_are_strictly_increasing() {
        let queue = ManualQueue::prompt();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        for expected in 1..=5 {
            assert_eq!(tracker.signal().unwrap(), expected);
        }
        assert_eq!(tracker.last_signaled_value(), 5);
        assert_eq!(queue.signaled(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_wait_on_completed_value_is_idempotent() {
        let queue = ManualQueue::held();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        let value = tracker.signal().unwrap();
        queue.complete_to(value);

        tracker.wait_for_value(value).unwrap();
        tracker.wait_for_value(value).unwrap();
        tracker.wait_for_value_timeout(value, Duration::ZERO).unwrap();
    }

    #[test]
    fn test_wait_returns_when_consumer_catches_up() {
        let queue = ManualQueue::held();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        let value = tracker.signal().unwrap();
        let remote = Arc::clone(&queue);
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.complete_to(value);
        });

        tracker.wait_for_value(value).unwrap();
        assert_eq!(tracker.completed_value().unwrap(), value);
        consumer.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires_on_stalled_consumer() {
        let queue = ManualQueue::held();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        let value = tracker.signal().unwrap();
        let start = Instant::now();
        let result = tracker.wait_for_value_timeout(value, Duration::from_millis(10));

        match result {
            Err(EngineError::Timeout { value: v, .. }) => assert_eq!(v, value),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_in_flight_signals_are_not_conflated() {
        let queue = ManualQueue::held();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        // Two signals pending at once; completing the first must not
        // satisfy a wait on the second.
        let first = tracker.signal().unwrap();
        let second = tracker.signal().unwrap();
        queue.complete_to(first);

        tracker.wait_for_value(first).unwrap();
        assert!(matches!(
            tracker.wait_for_value_timeout(second, Duration::from_millis(10)),
            Err(EngineError::Timeout { .. })
        ));

        queue.complete_to(second);
        tracker.wait_for_value(second).unwrap();
    }

    #[test]
    fn test_catch_up_scenario() {
        let queue = ManualQueue::held();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        for _ in 0..5 {
            tracker.signal().unwrap();
        }
        assert_eq!(tracker.completed_value().unwrap(), 0);

        queue.complete_to(3);
        tracker.wait_for_value(3).unwrap();
        assert!(matches!(
            tracker.wait_for_value_timeout(4, Duration::from_millis(10)),
            Err(EngineError::Timeout { value: 4, .. })
        ));

        queue.complete_to(4);
        tracker.wait_for_value(4).unwrap();
        queue.complete_to(5);
        tracker.wait_for_value(5).unwrap();
    }

    #[test]
    fn test_flush_covers_everything_signaled() {
        let queue = ManualQueue::prompt();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        tracker.signal().unwrap();
        tracker.signal().unwrap();

        let flushed = tracker.flush().unwrap();
        assert_eq!(flushed, 3);
        assert!(tracker.completed_value().unwrap() >= flushed);
    }

    #[test]
    fn test_back_to_back_flushes_are_safe() {
        let queue = ManualQueue::prompt();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        let first = tracker.flush().unwrap();
        let second = tracker.flush().unwrap();
        assert_eq!(second, first + 1);
    }

    #[test]
    fn test_timed_out_wait_leaves_later_waits_intact() {
        let queue = ManualQueue::held();
        let mut tracker = FenceTracker::new(Arc::clone(&queue));

        let value = tracker.signal().unwrap();
        assert!(
            tracker
                .wait_for_value_timeout(value, Duration::from_millis(5))
                .is_err()
        );

        // The stale registration from the timed-out wait may fire later;
        // the next wait must still resolve against the exact target.
        queue.complete_to(value);
        tracker.wait_for_value(value).unwrap();

        let next = tracker.signal().unwrap();
        assert!(matches!(
            tracker.wait_for_value_timeout(next, Duration::from_millis(5)),
            Err(EngineError::Timeout { .. })
        ));
        queue.complete_to(next);
        tracker.wait_for_value(next).unwrap();
    }

    #[test]
    #[should_panic(expected = "never signaled")]
    fn test_wait_on_unsignaled_value_asserts() {
        let queue = ManualQueue::held();
        let tracker = FenceTracker::new(queue);
        let _ = tracker.wait_for_value(7);
    }
}
