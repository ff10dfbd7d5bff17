//! Software execution queue.
//!
//! [`SoftwareQueue`] is a fully in-process consumer: a worker thread drains
//! submitted work items and signal packets in FIFO order, advancing a
//! monotonic completion value as signals retire. It stands in for a hardware
//! queue the way a software rasterizer stands in for a GPU (same interface,
//! no device), and is what the demo binary and the integration tests drive.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::event::FenceEvent;
use crate::queue::TimelineQueue;

type WorkFn = Box<dyn FnOnce() + Send + 'static>;

/// What the producer pushes down the channel.
enum Packet {
    /// A unit of consumer-side work, run on the worker thread.
    Execute(WorkFn),
    /// Report this completion value once everything before it has run.
    Signal(u64),
}

/// A waiter registered for a completion value not yet reached.
struct Waiter {
    value: u64,
    event: FenceEvent,
}

/// State shared between the producer-facing API and the worker thread.
#[derive(Default)]
struct QueueState {
    /// Last value reported by the worker. Never decreases.
    completed: u64,
    /// Set once the queue can make no further progress.
    lost: Option<String>,
    /// Waiters not yet satisfied, in registration order.
    waiters: Vec<Waiter>,
}

/// In-process execution queue with an asynchronous worker thread.
///
/// Work items are closures executed on the worker, so callers can model
/// consumer-side access to per-slot resources. Completion reporting follows
/// the [`TimelineQueue`] contract; [`fail`](Self::fail) injects device loss
/// for exercising the fatal-error path.
pub struct SoftwareQueue {
    /// `Some` until shutdown; dropping it disconnects the worker.
    sender: Option<Sender<Packet>>,
    state: Arc<Mutex<QueueState>>,
    worker: Option<JoinHandle<()>>,
}

impl SoftwareQueue {
    /// Spawns the worker thread and returns the queue.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`] if the worker thread cannot be
    /// created; the queue never existed and cannot make progress.
    pub fn new() -> EngineResult<Self> {
        let (sender, receiver) = unbounded();
        let state = Arc::new(Mutex::new(QueueState::default()));

        let worker_state = Arc::clone(&state);
        let worker = thread::Builder::new()
            .name("software-queue".into())
            .spawn(move || Self::run(receiver, worker_state))
            .map_err(|e| EngineError::DeviceLost(format!("failed to spawn worker: {e}")))?;

        info!("Software queue created");

        Ok(Self {
            sender: Some(sender),
            state,
            worker: Some(worker),
        })
    }

    /// Enqueues a unit of work for the consumer.
    ///
    /// The closure runs on the worker thread, strictly after everything
    /// already enqueued and before anything enqueued later.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DeviceLost`] if the queue is lost or the
    /// worker has exited.
    pub fn submit(&self, work: impl FnOnce() + Send + 'static) -> EngineResult<()> {
        self.check_alive()?;
        self.send(Packet::Execute(Box::new(work)))
    }

    /// Marks the queue as lost.
    ///
    /// Every operation afterwards reports [`EngineError::DeviceLost`], and
    /// all registered waiters are woken so none hangs on a dead queue.
    pub fn fail(&self, reason: &str) {
        let mut state = self.state.lock();
        if state.lost.is_some() {
            return;
        }
        warn!("Software queue marked lost: {reason}");
        state.lost = Some(reason.to_string());
        for waiter in state.waiters.drain(..) {
            waiter.event.set();
        }
    }

    fn check_alive(&self) -> EngineResult<()> {
        match &self.state.lock().lost {
            Some(reason) => Err(EngineError::DeviceLost(reason.clone())),
            None => Ok(()),
        }
    }

    fn send(&self, packet: Packet) -> EngineResult<()> {
        let Some(sender) = &self.sender else {
            return Err(EngineError::DeviceLost("queue is shut down".into()));
        };
        sender
            .send(packet)
            .map_err(|_| EngineError::DeviceLost("queue worker exited".into()))
    }

    /// Worker loop: drain packets until the channel disconnects.
    fn run(receiver: Receiver<Packet>, state: Arc<Mutex<QueueState>>) {
        for packet in receiver.iter() {
            match packet {
                Packet::Execute(work) => work(),
                Packet::Signal(value) => {
                    let mut state = state.lock();
                    debug_assert!(
                        value > state.completed,
                        "completion values must be monotonic"
                    );
                    state.completed = value;
                    state.waiters.retain(|waiter| {
                        if waiter.value <= value {
                            waiter.event.set();
                            false
                        } else {
                            true
                        }
                    });
                }
            }
        }
        debug!("Software queue worker exited");
    }
}

impl TimelineQueue for SoftwareQueue {
    fn enqueue_signal(&self, value: u64) -> EngineResult<()> {
        self.check_alive()?;
        self.send(Packet::Signal(value))
    }

    fn completed_value(&self) -> EngineResult<u64> {
        let state = self.state.lock();
        match &state.lost {
            Some(reason) => Err(EngineError::DeviceLost(reason.clone())),
            None => Ok(state.completed),
        }
    }

    fn register_wait(&self, value: u64, event: &FenceEvent) -> EngineResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.lost {
            return Err(EngineError::DeviceLost(reason.clone()));
        }
        if state.completed >= value {
            event.set();
        } else {
            state.waiters.push(Waiter {
                value,
                event: event.clone(),
            });
        }
        Ok(())
    }
}

impl Drop for SoftwareQueue {
    fn drop(&mut self) {
        // Disconnect first so the worker drains what remains and exits.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Software queue worker panicked");
            }
        }
        debug!("Software queue destroyed");
    }
}
