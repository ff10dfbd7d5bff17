//! Deterministic queue double for unit tests.

use std::sync::{Arc, Mutex};

use framepacer_engine::{EngineResult, FenceEvent, TimelineQueue};

/// Hand-stepped execution queue.
///
/// In held mode the completion value only advances when the test calls
/// [`complete_to`](Self::complete_to); in prompt mode every enqueued signal
/// completes immediately, modeling a consumer that is never behind.
pub(crate) struct ManualQueue {
    prompt: bool,
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    completed: u64,
    signaled: Vec<u64>,
    waiters: Vec<(u64, FenceEvent)>,
}

impl ManualQueue {
    /// A queue that never advances on its own.
    pub fn held() -> Arc<Self> {
        Arc::new(Self {
            prompt: false,
            inner: Mutex::default(),
        })
    }

    /// A queue that completes every signal the moment it is enqueued.
    pub fn prompt() -> Arc<Self> {
        Arc::new(Self {
            prompt: true,
            inner: Mutex::default(),
        })
    }

    /// Advances the completion value (never backwards) and wakes waiters.
    pub fn complete_to(&self, value: u64) {
        let mut state = self.inner.lock().unwrap();
        state.completed = state.completed.max(value);
        wake_satisfied(&mut state);
    }

    /// Every value passed to `enqueue_signal`, in order.
    pub fn signaled(&self) -> Vec<u64> {
        self.inner.lock().unwrap().signaled.clone()
    }
}

fn wake_satisfied(state: &mut State) {
    let completed = state.completed;
    state.waiters.retain(|(value, event)| {
        if *value <= completed {
            event.set();
            false
        } else {
            true
        }
    });
}

impl TimelineQueue for ManualQueue {
    fn enqueue_signal(&self, value: u64) -> EngineResult<()> {
        let mut state = self.inner.lock().unwrap();
        state.signaled.push(value);
        if self.prompt {
            state.completed = value;
            wake_satisfied(&mut state);
        }
        Ok(())
    }

    fn completed_value(&self) -> EngineResult<u64> {
        Ok(self.inner.lock().unwrap().completed)
    }

    fn register_wait(&self, value: u64, event: &FenceEvent) -> EngineResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.completed >= value {
            event.set();
        } else {
            state.waiters.push((value, event.clone()));
        }
        Ok(())
    }
}
