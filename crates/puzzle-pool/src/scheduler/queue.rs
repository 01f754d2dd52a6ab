//! Pending-task queue: priority order, FIFO within a priority.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use crate::bridge::protocol::{Priority, TaskId, TaskOutput, TaskRequest};
use crate::error::TaskError;

/// Sender half of a task's completion handle.
pub type Completion = oneshot::Sender<Result<TaskOutput, TaskError>>;

/// A submitted unit of work. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub request: TaskRequest,
    pub priority: Priority,
}

impl Task {
    pub fn new(request: TaskRequest, priority: Priority) -> Self {
        Self {
            id: TaskId::next(),
            request,
            priority,
        }
    }
}

/// A task waiting for a worker, together with the handle that will receive its result.
pub(crate) struct QueuedTask {
    pub task: Task,
    pub completion: Completion,
}

#[derive(Default)]
pub(crate) struct TaskQueue {
    tasks: VecDeque<QueuedTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append, then stable-sort by priority so equal priorities keep submission order.
    pub fn push(&mut self, task: Task, completion: Completion) {
        self.tasks.push_back(QueuedTask { task, completion });
        self.tasks
            .make_contiguous()
            .sort_by_key(|queued| queued.task.priority);
    }

    pub fn peek(&self) -> Option<&Task> {
        self.tasks.front().map(|queued| &queued.task)
    }

    pub fn pop(&mut self) -> Option<QueuedTask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove every queued task, dropping their completion handles.
    pub fn clear(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }
}
