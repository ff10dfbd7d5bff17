//! Notification primitive for fence waits.
//!
//! [`FenceEvent`] is the reusable handle a producer thread blocks on while
//! the execution queue works toward a target completion value. One event is
//! created per tracker and reused for every wait; it is never recreated per
//! wait. Release is RAII: dropping the last handle frees the primitive.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Reusable auto-reset event.
///
/// Semantics match an auto-reset OS event: `set` latches the signal,
/// a successful wait consumes it, and `reset` clears it explicitly.
/// Clones share the same underlying primitive, so a queue can retain a
/// handle and signal it after the waiter registered.
///
/// # Thread Safety
///
/// All operations take `&self` and may be called from any thread. The
/// intended shape is one waiting producer and one signaling consumer.
#[derive(Clone)]
pub struct FenceEvent {
    inner: Arc<EventInner>,
}

struct EventInner {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl FenceEvent {
    /// Creates a new event in the unsignaled state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventInner {
                signaled: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    /// Latches the signal and wakes waiters.
    pub fn set(&self) {
        let mut signaled = self.inner.signaled.lock();
        *signaled = true;
        self.inner.cond.notify_all();
    }

    /// Clears a latched signal without waiting.
    pub fn reset(&self) {
        *self.inner.signaled.lock() = false;
    }

    /// Blocks until the event is set, then consumes the signal.
    pub fn wait(&self) {
        let mut signaled = self.inner.signaled.lock();
        while !*signaled {
            self.inner.cond.wait(&mut signaled);
        }
        *signaled = false;
    }

    /// Blocks until the event is set or the deadline passes.
    ///
    /// Returns `true` if the signal was consumed, `false` on timeout.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut signaled = self.inner.signaled.lock();
        while !*signaled {
            if self.inner.cond.wait_until(&mut signaled, deadline).timed_out() {
                // The signal may land exactly as the deadline expires.
                if *signaled {
                    break;
                }
                return false;
            }
        }
        *signaled = false;
        true
    }

    /// Blocks for at most `timeout`.
    ///
    /// Returns `true` if the signal was consumed, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.wait_until(Instant::now() + timeout)
    }
}

impl Default for FenceEvent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_set_before_wait_returns_immediately() {
        let event = FenceEvent::new();
        event.set();
        assert!(event.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_wait_consumes_signal() {
        let event = FenceEvent::new();
        event.set();
        assert!(event.wait_timeout(Duration::ZERO));
        // Auto-reset: the second wait must block until the timeout.
        assert!(!event.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_wait_times_out_without_signal() {
        let event = FenceEvent::new();
        let start = Instant::now();
        assert!(!event.wait_timeout(Duration::from_millis(10)));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_cross_thread_set_wakes_waiter() {
        let event = FenceEvent::new();
        let remote = event.clone();
        let signaler = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            remote.set();
        });
        assert!(event.wait_timeout(Duration::from_secs(5)));
        signaler.join().unwrap();
    }

    #[test]
    fn test_reset_clears_pending_signal() {
        let event = FenceEvent::new();
        event.set();
        event.reset();
        assert!(!event.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_event_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FenceEvent>();
    }
}
