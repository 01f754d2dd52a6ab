//! Caller-facing error types.

use crate::bridge::protocol::TaskKind;
use crate::worker::SpawnError;

/// Generic message used when a worker reports failure without saying why.
pub const UNKNOWN_WORKER_ERROR: &str = "unknown worker error";

/// Pool-level failures: construction and submission.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to start worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: SpawnError,
    },
    #[error("no tokio runtime available to run the pool coordinator")]
    NoRuntime,
    #[error("pool has been terminated")]
    Terminated,
}

/// Failure of a single task, delivered to the caller that submitted it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The worker ran the task and reported an error.
    #[error("{0}")]
    Worker(String),
    /// The worker assigned to the task stopped accepting requests.
    #[error("worker unavailable")]
    WorkerUnavailable,
    /// The worker answered with a payload that does not fit the request.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The pool terminated before the task produced a result.
    #[error("task abandoned: pool terminated")]
    Abandoned,
}

impl TaskError {
    /// Worker-reported failure, falling back to a generic message when none was given.
    pub fn from_worker(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => Self::Worker(m),
            _ => Self::Worker(UNKNOWN_WORKER_ERROR.to_string()),
        }
    }

    pub(crate) fn missing_payload(kind: TaskKind) -> Self {
        Self::Protocol(format!("{kind} response carried no payload"))
    }

    pub(crate) fn wrong_payload(expected: TaskKind, got: TaskKind) -> Self {
        Self::Protocol(format!("expected {expected} result, got {got} result"))
    }
}
