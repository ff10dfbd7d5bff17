//! Engine-boundary error types.

use std::time::Duration;

use thiserror::Error;

/// Errors reported by an execution queue or by operations waiting on one.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The execution queue is gone (device lost, worker exited). Fatal:
    /// no further progress is possible on this queue; the caller must tear
    /// down and recreate the execution context.
    #[error("execution queue lost: {0}")]
    DeviceLost(String),

    /// A wait did not reach its target value within the allowed time.
    /// Recoverable: the caller decides whether to retry, extend the
    /// timeout, or treat the queue as hung.
    #[error("wait for value {value} timed out after {timeout:?}")]
    Timeout { value: u64, timeout: Duration },
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
