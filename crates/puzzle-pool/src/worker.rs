//! Workers - the units that actually run tasks.
//!
//! The coordinator side (queueing, dispatch, correlation) is in orchestrator.rs.
//!
//! A worker owns one request channel and writes `(WorkerId, WorkerResponse)`
//! into the shared response channel. It handles one request at a time and
//! answers every request exactly once.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::bridge::protocol::{TaskOutput, TaskRequest, WorkerId, WorkerRequest, WorkerResponse};
use crate::engine::SudokuEngine;

/// Channel on which every worker reports results, tagged with its identity.
pub type ResponseSender = mpsc::UnboundedSender<(WorkerId, WorkerResponse)>;

/// The computation a worker performs. Opaque to the scheduler.
pub trait Engine: Send + Sync + 'static {
    /// Run one task. An `Err` becomes an error response carrying the message.
    fn run(&self, request: &TaskRequest) -> Result<TaskOutput, String>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to spawn worker thread: {0}")]
    Thread(#[from] std::io::Error),
    #[error("spawn failed: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
#[error("worker {0} is no longer accepting requests")]
pub struct WorkerClosed(pub WorkerId);

/// Coordinator-side handle to one worker.
///
/// Dropping the handle closes the worker's request channel; the worker exits
/// after its current request.
#[derive(Debug)]
pub struct WorkerHandle {
    id: WorkerId,
    tx: mpsc::UnboundedSender<WorkerRequest>,
}

impl WorkerHandle {
    pub fn new(id: WorkerId, tx: mpsc::UnboundedSender<WorkerRequest>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn send(&self, request: WorkerRequest) -> Result<(), WorkerClosed> {
        self.tx.send(request).map_err(|_| WorkerClosed(self.id))
    }
}

/// Extension point for different worker strategies.
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self, id: WorkerId, responses: ResponseSender) -> Result<WorkerHandle, SpawnError>;
}

/// Runs each worker on a dedicated OS thread.
pub struct ThreadSpawner {
    engine: Arc<dyn Engine>,
}

impl ThreadSpawner {
    pub fn new(engine: impl Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new(SudokuEngine)
    }
}

impl WorkerSpawner for ThreadSpawner {
    fn spawn(&self, id: WorkerId, responses: ResponseSender) -> Result<WorkerHandle, SpawnError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::clone(&self.engine);
        std::thread::Builder::new()
            .name(format!("puzzle-worker-{id}"))
            .spawn(move || run_worker(id, engine, rx, responses))?;
        tracing::debug!(worker = %id, "Worker thread started");
        Ok(WorkerHandle::new(id, tx))
    }
}

/// Worker loop: one request in, one response out, until the request channel
/// closes or nobody is listening for responses.
pub fn run_worker(
    id: WorkerId,
    engine: Arc<dyn Engine>,
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    responses: ResponseSender,
) {
    while let Some(request) = requests.blocking_recv() {
        let response = execute(id, engine.as_ref(), request);
        if responses.send((id, response)).is_err() {
            tracing::debug!(worker = %id, "Response channel closed - discarding result");
            break;
        }
    }
    tracing::debug!(worker = %id, "Worker exiting");
}

fn execute(id: WorkerId, engine: &dyn Engine, request: WorkerRequest) -> WorkerResponse {
    let started = Instant::now();
    let kind = request.task.kind();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.run(&request.task)));
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(output)) => {
            tracing::trace!(worker = %id, task_id = %request.id, %kind, ?elapsed, "Task computed");
            WorkerResponse::success(request.id, output)
        }
        Ok(Err(error)) => {
            tracing::trace!(worker = %id, task_id = %request.id, %kind, ?elapsed, %error, "Task computation failed");
            WorkerResponse::error(request.id, error)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(worker = %id, task_id = %request.id, %kind, %message, "Engine panicked");
            WorkerResponse::error(request.id, format!("worker panicked: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::{ResponseStatus, TaskId};
    use sudoku_engine::{Board, Difficulty};

    struct PanickingEngine;

    impl Engine for PanickingEngine {
        fn run(&self, request: &TaskRequest) -> Result<TaskOutput, String> {
            match request {
                TaskRequest::Generate { .. } => panic!("generator exploded"),
                _ => Err("refused".to_string()),
            }
        }
    }

    #[tokio::test]
    async fn thread_worker_answers_each_request() {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let handle = ThreadSpawner::default()
            .spawn(WorkerId::new(3), resp_tx)
            .unwrap();
        assert_eq!(handle.id(), WorkerId::new(3));

        let id = TaskId::from_raw(42);
        handle
            .send(WorkerRequest {
                id,
                task: TaskRequest::Validate {
                    board: Board::empty(),
                },
            })
            .unwrap();

        let (from, response) = resp_rx.recv().await.unwrap();
        assert_eq!(from, WorkerId::new(3));
        assert_eq!(response.id, id);
        assert_eq!(response.status, ResponseStatus::Success);
        assert!(matches!(response.payload, Some(TaskOutput::Validated(_))));
    }

    #[tokio::test]
    async fn panics_become_error_responses() {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let handle = ThreadSpawner::new(PanickingEngine)
            .spawn(WorkerId::new(0), resp_tx)
            .unwrap();

        let boom = TaskId::from_raw(1);
        handle
            .send(WorkerRequest {
                id: boom,
                task: TaskRequest::Generate {
                    difficulty: Difficulty::Easy,
                },
            })
            .unwrap();
        let (_, response) = resp_rx.recv().await.unwrap();
        assert_eq!(response.id, boom);
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(
            response.error.as_deref(),
            Some("worker panicked: generator exploded")
        );

        // The worker survives the panic.
        let next = TaskId::from_raw(2);
        handle
            .send(WorkerRequest {
                id: next,
                task: TaskRequest::Solve {
                    board: Board::empty(),
                },
            })
            .unwrap();
        let (_, response) = resp_rx.recv().await.unwrap();
        assert_eq!(response, WorkerResponse::error(next, "refused"));
    }

    #[tokio::test]
    async fn dropping_handle_stops_worker() {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let handle = ThreadSpawner::default()
            .spawn(WorkerId::new(0), resp_tx)
            .unwrap();
        drop(handle);
        // The worker drops its response sender on exit, closing the channel.
        assert!(resp_rx.recv().await.is_none());
    }

    #[test]
    fn send_to_closed_worker_fails() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = WorkerHandle::new(WorkerId::new(5), tx);
        let err = handle
            .send(WorkerRequest {
                id: TaskId::from_raw(1),
                task: TaskRequest::Generate {
                    difficulty: Difficulty::Easy,
                },
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "worker 5 is no longer accepting requests");
    }
}
