//! Caller-facing pool API.
//!
//! `Pool` is a thin handle: every operation is a message to the coordinator
//! task started in `Pool::new`. Results come back through `TaskHandle`s.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::bridge::protocol::{Priority, TaskId, TaskOutput, TaskRequest};
use crate::config::PoolConfig;
use crate::error::{PoolError, TaskError};
use crate::orchestrator::{Command, run_event_loop, spawn_workers};
use crate::scheduler::{Scheduler, Task};
use crate::stats::PoolStats;

/// Fixed-size worker pool with two-level priority scheduling.
///
/// Must be created inside a tokio runtime. Dropping the pool terminates it.
pub struct Pool {
    size: usize,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
    terminated: AtomicBool,
}

impl Pool {
    /// Start `config.pool_size()` workers and the coordinator task.
    ///
    /// If any worker fails to start, those already started are released and
    /// the error is returned; no pool exists.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        let size = config.pool_size();

        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let workers = spawn_workers(size, config.spawner.as_ref(), &response_tx)?;
        // Workers hold the only senders; the channel closes when they all exit.
        drop(response_tx);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        runtime.spawn(run_event_loop(
            Scheduler::new(size),
            workers,
            command_rx,
            response_rx,
            shutdown.clone(),
        ));

        tracing::info!(size, hint = ?config.concurrency_hint, "Pool started");
        Ok(Self {
            size,
            commands: command_tx,
            shutdown,
            terminated: AtomicBool::new(false),
        })
    }

    /// Number of workers, fixed at construction.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue a task. The returned handle resolves with its result.
    pub fn submit(&self, request: TaskRequest, priority: Priority) -> Result<TaskHandle, PoolError> {
        if self.is_terminated() {
            return Err(PoolError::Terminated);
        }
        let task = Task::new(request, priority);
        let id = task.id;
        let (completion, rx) = oneshot::channel();
        self.commands
            .send(Command::Submit { task, completion })
            .map_err(|_| PoolError::Terminated)?;
        Ok(TaskHandle { id, priority, rx })
    }

    /// `submit` at the default (`High`) priority.
    pub fn submit_high(&self, request: TaskRequest) -> Result<TaskHandle, PoolError> {
        self.submit(request, Priority::default())
    }

    /// Snapshot of slot and queue state, taken between coordinator events.
    pub async fn stats(&self) -> Result<PoolStats, PoolError> {
        if self.is_terminated() {
            return Err(PoolError::Terminated);
        }
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Stats { reply })
            .map_err(|_| PoolError::Terminated)?;
        rx.await.map_err(|_| PoolError::Terminated)
    }

    /// Stop the pool. Workers are released and later submissions fail with
    /// `PoolError::Terminated`. Calling it again does nothing.
    ///
    /// Handles for queued and in-flight tasks do not hang: each resolves to
    /// `Err(TaskError::Abandoned)` rather than never resolving. No worker
    /// result is delivered after this call.
    pub fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!(size = self.size, "Terminating pool");
        self.shutdown.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Pending result of a submitted task.
///
/// Resolves exactly once: with the worker's output, the task's error, or
/// `TaskError::Abandoned` if the pool went away first.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    priority: Priority,
    rx: oneshot::Receiver<Result<TaskOutput, TaskError>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl Future for TaskHandle {
    type Output = Result<TaskOutput, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Abandoned)))
    }
}
