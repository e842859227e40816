//! Bounded waiting on blocking collaborator calls.
//!
//! The worker thread is detached: when the deadline passes the caller gets
//! [`DeadlineError::Elapsed`] immediately, and whatever the worker eventually
//! produces is dropped.

use crossbeam_channel::{bounded, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Why a bounded call produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    /// The work did not finish before the deadline.
    #[error("operation '{name}' did not complete within {timeout:?}")]
    Elapsed {
        /// Name of the operation, for diagnostics.
        name: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The worker thread panicked or could not be started.
    #[error("worker for '{0}' exited without a result")]
    WorkerLost(String),
}

/// Run `work` on a worker thread and wait at most `timeout` for its result.
///
/// # Example
///
/// ```
/// use geoscope_common::run_with_timeout;
/// use std::time::Duration;
///
/// let sum = run_with_timeout("sum", Duration::from_secs(1), || 2 + 2).unwrap();
/// assert_eq!(sum, 4);
/// ```
pub fn run_with_timeout<T, F>(name: &str, timeout: Duration, work: F) -> Result<T, DeadlineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded(1);

    thread::Builder::new()
        .name(format!("geoscope-{}", name))
        .spawn(move || {
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(work());
        })
        .map_err(|_| DeadlineError::WorkerLost(name.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(operation = name, ?timeout, "bounded call timed out");
            Err(DeadlineError::Elapsed {
                name: name.to_string(),
                timeout,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(DeadlineError::WorkerLost(name.to_string())),
    }
}
