//! Scheduler - admission control, dispatch and response correlation.
//!
//! Pure, synchronous state machine. The orchestrator feeds it events
//! (`submit`, `handle_response`, `dispatch_failed`) one at a time and sends
//! the returned `Dispatch`es to workers.

use std::collections::HashMap;

use crate::bridge::protocol::{
    Priority, ResponseStatus, TaskId, TaskKind, WorkerId, WorkerRequest, WorkerResponse,
};
use crate::error::TaskError;
use crate::stats::PoolStats;

use super::queue::{Completion, QueuedTask, Task, TaskQueue};
use super::slot::{SlotState, WorkerSlot};

/// A request that must be delivered to `worker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub worker: WorkerId,
    pub request: WorkerRequest,
}

struct PendingCompletion {
    worker: WorkerId,
    kind: TaskKind,
    completion: Completion,
}

pub struct Scheduler {
    slots: Vec<WorkerSlot>,
    queue: TaskQueue,
    pending: HashMap<TaskId, PendingCompletion>,
}

impl Scheduler {
    /// `size` is used as given; callers clamp it.
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|i| WorkerSlot::new(WorkerId::new(i))).collect(),
            queue: TaskQueue::new(),
            pending: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_state(&self, worker: WorkerId) -> Option<SlotState> {
        self.slots.get(worker.index()).map(|s| s.state())
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn free_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_idle()).count()
    }

    fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_poisoned()).count()
    }

    /// Enqueue a task and dispatch whatever is now eligible.
    pub fn submit(&mut self, task: Task, completion: Completion) -> Vec<Dispatch> {
        tracing::debug!(
            task_id = %task.id,
            kind = %task.request.kind(),
            priority = %task.priority,
            "Task queued"
        );
        self.queue.push(task, completion);
        self.schedule()
    }

    /// Dispatch queued tasks to free workers until the queue head is not admissible.
    ///
    /// A `Low` head is held back when it would take the last free worker,
    /// unless only one live worker exists.
    pub fn schedule(&mut self) -> Vec<Dispatch> {
        if self.live_count() == 0 {
            self.reject_queued();
            return Vec::new();
        }

        let mut dispatches = Vec::new();
        loop {
            let (head_id, head_priority) = match self.queue.peek() {
                Some(head) => (head.id, head.priority),
                None => break,
            };

            let free = self.free_count();
            if free == 0 {
                break;
            }
            if head_priority == Priority::Low && free <= 1 && self.live_count() > 1 {
                tracing::trace!(task_id = %head_id, "Holding low-priority task: last free worker is reserved");
                break;
            }

            let Some(slot) = self.slots.iter_mut().find(|s| s.is_idle()) else {
                break;
            };
            let Some(QueuedTask { task, completion }) = self.queue.pop() else {
                break;
            };

            slot.assign(task.id);
            let worker = slot.id();
            let kind = task.request.kind();
            self.pending.insert(
                task.id,
                PendingCompletion {
                    worker,
                    kind,
                    completion,
                },
            );
            tracing::debug!(
                task_id = %task.id,
                %worker,
                %kind,
                priority = %task.priority,
                "Dispatching task"
            );
            dispatches.push(Dispatch {
                worker,
                request: WorkerRequest {
                    id: task.id,
                    task: task.request,
                },
            });
        }
        dispatches
    }

    /// Free the responding worker, resolve the pending task the response
    /// names and dispatch further work.
    ///
    /// The sender's slot is freed by worker identity whatever id the response
    /// carries. The completion is found by task id alone; a response for an
    /// unknown id resolves nothing. A response from an unknown worker is
    /// discarded entirely.
    pub fn handle_response(&mut self, from: WorkerId, response: WorkerResponse) -> Vec<Dispatch> {
        let id = response.id;

        let Some(slot) = self.slots.get_mut(from.index()) else {
            tracing::warn!(worker = %from, task_id = %id, "Response from unknown worker - discarding");
            return Vec::new();
        };
        match slot.release() {
            Some(running) if running != id => {
                tracing::warn!(
                    worker = %from,
                    task_id = %id,
                    running = %running,
                    "Response does not match the task running on this worker"
                );
            }
            Some(_) => {}
            None => {
                tracing::debug!(worker = %from, task_id = %id, state = ?slot.state(), "Response from a worker that was not busy");
            }
        }

        match self.pending.remove(&id) {
            Some(pending) => {
                if pending.worker != from {
                    tracing::warn!(
                        worker = %from,
                        assigned = %pending.worker,
                        task_id = %id,
                        "Task answered by a worker it was not dispatched to"
                    );
                }
                complete(id, pending, response);
            }
            None => {
                tracing::debug!(worker = %from, task_id = %id, "Discarding response for unknown task");
            }
        }

        self.schedule()
    }

    /// A dispatch could not be delivered: the worker is gone. Poison its slot,
    /// fail the task and reschedule.
    pub fn dispatch_failed(&mut self, worker: WorkerId, id: TaskId) -> Vec<Dispatch> {
        if let Some(slot) = self.slots.get_mut(worker.index()) {
            slot.poison();
        }
        if let Some(pending) = self.pending.remove(&id) {
            tracing::warn!(task_id = %id, %worker, "Failing task: worker unavailable");
            let _ = pending.completion.send(Err(TaskError::WorkerUnavailable));
        }
        self.schedule()
    }

    fn reject_queued(&mut self) {
        while let Some(QueuedTask { task, completion }) = self.queue.pop() {
            tracing::warn!(task_id = %task.id, "Failing task: no live workers");
            let _ = completion.send(Err(TaskError::WorkerUnavailable));
        }
    }

    /// Drop every queued and in-flight completion. Returns `(queued, in_flight)`.
    pub fn abandon_all(&mut self) -> (usize, usize) {
        let queued = self.queue.clear();
        let in_flight = self.pending.len();
        self.pending.clear();
        (queued, in_flight)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.slots.len(),
            idle: self.free_count(),
            busy: self.slots.iter().filter(|s| s.is_busy()).count(),
            poisoned: self.slots.iter().filter(|s| s.is_poisoned()).count(),
            queued: self.queue.len(),
            in_flight: self.pending.len(),
        }
    }
}

fn complete(id: TaskId, pending: PendingCompletion, response: WorkerResponse) {
    let kind = pending.kind;
    let result = match response.status {
        ResponseStatus::Success => match response.payload {
            Some(output) if output.kind() == kind => Ok(output),
            Some(output) => Err(TaskError::wrong_payload(kind, output.kind())),
            None => Err(TaskError::missing_payload(kind)),
        },
        ResponseStatus::Error => Err(TaskError::from_worker(response.error)),
    };

    match &result {
        Ok(_) => {
            tracing::info!(target: "puzzle_pool::task", task_id = %id, %kind, "Task succeeded");
        }
        Err(error) => {
            tracing::info!(target: "puzzle_pool::task", task_id = %id, %kind, %error, "Task failed");
        }
    }

    if pending.completion.send(result).is_err() {
        tracing::debug!(task_id = %id, "Task handle dropped before completion");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::{TaskOutput, TaskRequest};
    use sudoku_engine::{Board, Validation};
    use tokio::sync::oneshot;
    use tokio::sync::oneshot::error::TryRecvError;

    type Receiver = oneshot::Receiver<Result<TaskOutput, TaskError>>;

    fn validate_task(priority: Priority) -> Task {
        Task::new(
            TaskRequest::Validate {
                board: Board::empty(),
            },
            priority,
        )
    }

    fn submit(s: &mut Scheduler, priority: Priority) -> (TaskId, Receiver, Vec<Dispatch>) {
        let task = validate_task(priority);
        let id = task.id;
        let (tx, rx) = oneshot::channel();
        let dispatches = s.submit(task, tx);
        (id, rx, dispatches)
    }

    /// A validate result tagged with `n` so payloads are distinguishable.
    fn validated(id: TaskId, n: usize) -> WorkerResponse {
        WorkerResponse::success(
            id,
            TaskOutput::Validated(Validation {
                conflicts: vec![],
                solutions: n,
            }),
        )
    }

    fn dispatched_ids(dispatches: &[Dispatch]) -> Vec<TaskId> {
        dispatches.iter().map(|d| d.request.id).collect()
    }

    #[test]
    fn fifo_within_priority_on_free_workers() {
        let mut s = Scheduler::new(4);
        let (a, _ra, da) = submit(&mut s, Priority::High);
        let (b, _rb, db) = submit(&mut s, Priority::High);
        let (c, _rc, dc) = submit(&mut s, Priority::High);

        assert_eq!(dispatched_ids(&da), vec![a]);
        assert_eq!(dispatched_ids(&db), vec![b]);
        assert_eq!(dispatched_ids(&dc), vec![c]);
        assert_eq!(da[0].worker, WorkerId::new(0));
        assert_eq!(db[0].worker, WorkerId::new(1));
        assert_eq!(dc[0].worker, WorkerId::new(2));
    }

    #[test]
    fn fifo_within_priority_when_queued() {
        let mut s = Scheduler::new(2);
        let (x, _rx, _) = submit(&mut s, Priority::High);
        let (y, _ry, _) = submit(&mut s, Priority::High);
        let (a, _ra, da) = submit(&mut s, Priority::High);
        let (b, _rb, db) = submit(&mut s, Priority::High);
        assert!(da.is_empty() && db.is_empty());
        assert_eq!(s.queued(), 2);

        let d = s.handle_response(WorkerId::new(1), validated(y, 0));
        assert_eq!(dispatched_ids(&d), vec![a]);
        assert_eq!(d[0].worker, WorkerId::new(1));

        let d = s.handle_response(WorkerId::new(0), validated(x, 0));
        assert_eq!(dispatched_ids(&d), vec![b]);
    }

    #[test]
    fn high_dispatched_before_waiting_low() {
        let mut s = Scheduler::new(2);
        let (x, _rx, _) = submit(&mut s, Priority::High);
        let (_y, _ry, _) = submit(&mut s, Priority::High);
        let (low, _rl, _) = submit(&mut s, Priority::Low);
        let (high, _rh, _) = submit(&mut s, Priority::High);

        let d = s.handle_response(WorkerId::new(0), validated(x, 0));
        assert_eq!(dispatched_ids(&d), vec![high]);
        assert_eq!(s.queued(), 1);
        assert_eq!(s.queue.peek().map(|t| t.id), Some(low));
    }

    #[test]
    fn reservation_holds_low_for_last_free_worker() {
        let mut s = Scheduler::new(4);
        for _ in 0..3 {
            submit(&mut s, Priority::High);
        }
        assert_eq!(s.stats().idle, 1);

        let (_low, _rl, dl) = submit(&mut s, Priority::Low);
        assert!(dl.is_empty());
        assert_eq!(s.queued(), 1);

        let (high, _rh, dh) = submit(&mut s, Priority::High);
        assert_eq!(dispatched_ids(&dh), vec![high]);
        assert_eq!(dh[0].worker, WorkerId::new(3));
        assert_eq!(s.queued(), 1);
        assert_eq!(s.stats().idle, 0);
    }

    #[test]
    fn low_tasks_fill_all_but_one_worker() {
        let mut s = Scheduler::new(4);
        let dispatched: usize = (0..5)
            .map(|_| submit(&mut s, Priority::Low).2.len())
            .sum();
        assert_eq!(dispatched, 3);
        assert_eq!(s.queued(), 2);
        assert_eq!(s.stats().idle, 1);
    }

    #[test]
    fn reservation_waived_for_single_worker() {
        let mut s = Scheduler::new(1);
        let (first, _r1, d1) = submit(&mut s, Priority::Low);
        assert_eq!(dispatched_ids(&d1), vec![first]);

        let (second, _r2, d2) = submit(&mut s, Priority::Low);
        assert!(d2.is_empty());

        let d = s.handle_response(WorkerId::new(0), validated(first, 0));
        assert_eq!(dispatched_ids(&d), vec![second]);
    }

    #[test]
    fn responses_correlate_by_id_not_order() {
        let mut s = Scheduler::new(4);
        let submitted: Vec<_> = (0..4).map(|_| submit(&mut s, Priority::High)).collect();

        // Answer in reverse order, each tagged with its submission index.
        for (n, (id, _, dispatches)) in submitted.iter().enumerate().rev() {
            s.handle_response(dispatches[0].worker, validated(*id, n));
        }

        for (n, (_, mut rx, _)) in submitted.into_iter().enumerate() {
            match rx.try_recv().unwrap() {
                Ok(TaskOutput::Validated(v)) => assert_eq!(v.solutions, n),
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert!(s.stats().is_quiescent());
    }

    #[test]
    fn stray_response_frees_sender_and_dispatches_queued_head() {
        let mut s = Scheduler::new(2);
        let (a, mut ra, da) = submit(&mut s, Priority::High);
        let (b, mut rb, db) = submit(&mut s, Priority::High);
        let (c, mut rc, dc) = submit(&mut s, Priority::High);
        assert_eq!(da[0].worker, WorkerId::new(0));
        assert_eq!(db[0].worker, WorkerId::new(1));
        assert!(dc.is_empty());

        let out = s.handle_response(
            WorkerId::new(0),
            WorkerResponse::error(TaskId::from_raw(u64::MAX), "stray"),
        );
        assert_eq!(dispatched_ids(&out), vec![c]);
        assert_eq!(out[0].worker, WorkerId::new(0));
        assert_eq!(s.slot_state(WorkerId::new(0)), Some(SlotState::Busy(c)));
        assert_eq!(s.slot_state(WorkerId::new(1)), Some(SlotState::Busy(b)));

        // No pending future was resolved by the stray id.
        assert_eq!(ra.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(rb.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(rc.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(s.in_flight(), 3);
        assert_eq!(s.queued(), 0);

        // The original task can still be answered by id.
        s.handle_response(WorkerId::new(0), validated(a, 7));
        match ra.try_recv().unwrap() {
            Ok(TaskOutput::Validated(v)) => assert_eq!(v.solutions, 7),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_task_response_on_idle_worker_resolves_nothing() {
        let mut s = Scheduler::new(2);
        let (id, mut rx, d) = submit(&mut s, Priority::High);
        assert_eq!(d[0].worker, WorkerId::new(0));

        let out = s.handle_response(WorkerId::new(1), validated(TaskId::from_raw(u64::MAX), 0));
        assert!(out.is_empty());
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(s.slot_state(WorkerId::new(0)), Some(SlotState::Busy(id)));
        assert_eq!(s.slot_state(WorkerId::new(1)), Some(SlotState::Idle));
        assert_eq!(s.in_flight(), 1);
    }

    #[test]
    fn unknown_worker_response_is_discarded() {
        let mut s = Scheduler::new(2);
        let (id, mut rx, d) = submit(&mut s, Priority::High);

        s.handle_response(WorkerId::new(99), validated(id, 0));
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(s.slot_state(d[0].worker), Some(SlotState::Busy(id)));

        // The real worker's answer still lands.
        s.handle_response(d[0].worker, validated(id, 0));
        assert!(rx.try_recv().unwrap().is_ok());
    }

    #[test]
    fn response_from_other_worker_resolves_by_id_and_frees_sender() {
        let mut s = Scheduler::new(2);
        let (a, mut ra, da) = submit(&mut s, Priority::High);
        let (_b, mut rb, db) = submit(&mut s, Priority::High);
        let (c, _rc, dc) = submit(&mut s, Priority::High);
        assert!(dc.is_empty());

        // Worker 1 reports task `a`, which was dispatched to worker 0.
        let out = s.handle_response(db[0].worker, validated(a, 3));
        match ra.try_recv().unwrap() {
            Ok(TaskOutput::Validated(v)) => assert_eq!(v.solutions, 3),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(dispatched_ids(&out), vec![c]);
        assert_eq!(out[0].worker, db[0].worker);

        // Worker 0 is untouched; task `b` is still pending.
        assert_eq!(s.slot_state(da[0].worker), Some(SlotState::Busy(a)));
        assert_eq!(rb.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(s.in_flight(), 2);
    }

    #[test]
    fn poisoned_worker_response_leaves_slot_poisoned() {
        let mut s = Scheduler::new(3);
        let (a, _ra, da) = submit(&mut s, Priority::High);
        s.dispatch_failed(da[0].worker, a);

        s.handle_response(da[0].worker, validated(a, 0));
        assert_eq!(s.slot_state(da[0].worker), Some(SlotState::Poisoned));
        assert_eq!(s.stats().poisoned, 1);
    }

    #[test]
    fn completion_dispatches_queued_task_immediately() {
        let mut s = Scheduler::new(2);
        let (first, _r1, d1) = submit(&mut s, Priority::High);
        submit(&mut s, Priority::High);
        let (waiting, _rw, dw) = submit(&mut s, Priority::High);
        assert!(dw.is_empty());

        let d = s.handle_response(d1[0].worker, validated(first, 0));
        assert_eq!(
            d,
            vec![Dispatch {
                worker: d1[0].worker,
                request: WorkerRequest {
                    id: waiting,
                    task: TaskRequest::Validate {
                        board: Board::empty()
                    },
                },
            }]
        );
        assert_eq!(s.queued(), 0);
    }

    #[test]
    fn error_without_message_uses_fallback() {
        let mut s = Scheduler::new(2);
        let (id, mut rx, d) = submit(&mut s, Priority::High);
        let response = WorkerResponse {
            id,
            status: ResponseStatus::Error,
            payload: None,
            error: None,
        };
        s.handle_response(d[0].worker, response);

        let err = rx.try_recv().unwrap().unwrap_err();
        assert_eq!(err, TaskError::Worker("unknown worker error".to_string()));
        // The failed task does not retire its worker.
        assert_eq!(s.slot_state(d[0].worker), Some(SlotState::Idle));
    }

    #[test]
    fn error_message_is_surfaced() {
        let mut s = Scheduler::new(2);
        let (id, mut rx, d) = submit(&mut s, Priority::High);
        s.handle_response(d[0].worker, WorkerResponse::error(id, "board has no solution"));
        assert_eq!(
            rx.try_recv().unwrap(),
            Err(TaskError::Worker("board has no solution".to_string()))
        );
    }

    #[test]
    fn mismatched_payload_is_protocol_error() {
        let mut s = Scheduler::new(2);
        let (id, mut rx, d) = submit(&mut s, Priority::High);
        let response = WorkerResponse::success(
            id,
            TaskOutput::Solved {
                board: Board::empty(),
            },
        );
        s.handle_response(d[0].worker, response);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(TaskError::Protocol(_))
        ));

        let (id, mut rx, d) = submit(&mut s, Priority::High);
        let response = WorkerResponse {
            id,
            status: ResponseStatus::Success,
            payload: None,
            error: None,
        };
        s.handle_response(d[0].worker, response);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(TaskError::Protocol(_))
        ));
    }

    #[test]
    fn failed_dispatch_poisons_slot_and_reschedules() {
        let mut s = Scheduler::new(3);
        let (a, mut ra, da) = submit(&mut s, Priority::High);
        let (b, _rb, _) = submit(&mut s, Priority::High);
        let (_c, _rc, _) = submit(&mut s, Priority::High);
        let (d_id, _rd, dd) = submit(&mut s, Priority::High);
        assert!(dd.is_empty());

        let out = s.dispatch_failed(da[0].worker, a);
        assert_eq!(ra.try_recv().unwrap(), Err(TaskError::WorkerUnavailable));
        assert_eq!(s.slot_state(da[0].worker), Some(SlotState::Poisoned));
        assert!(out.is_empty());
        assert_eq!(s.stats().poisoned, 1);
        assert_eq!(s.queued(), 1);

        // The queued task goes to a surviving worker once one frees up.
        let out = s.handle_response(WorkerId::new(1), validated(b, 0));
        assert_eq!(dispatched_ids(&out), vec![d_id]);
    }

    #[test]
    fn reservation_waived_when_one_live_worker_remains() {
        let mut s = Scheduler::new(2);
        let (a, _ra, da) = submit(&mut s, Priority::High);
        s.dispatch_failed(da[0].worker, a);

        let (low, _rl, dl) = submit(&mut s, Priority::Low);
        assert_eq!(dispatched_ids(&dl), vec![low]);
    }

    #[test]
    fn queued_tasks_fail_when_no_live_workers() {
        let mut s = Scheduler::new(2);
        let (a, _ra, da) = submit(&mut s, Priority::High);
        let (b, _rb, db) = submit(&mut s, Priority::High);
        let (_c, mut rc, _) = submit(&mut s, Priority::High);

        s.dispatch_failed(da[0].worker, a);
        s.dispatch_failed(db[0].worker, b);
        assert_eq!(rc.try_recv().unwrap(), Err(TaskError::WorkerUnavailable));
        assert_eq!(s.stats().health(), crate::stats::PoolHealth::Defunct);

        let (_d, mut rd, dd) = submit(&mut s, Priority::High);
        assert!(dd.is_empty());
        assert_eq!(rd.try_recv().unwrap(), Err(TaskError::WorkerUnavailable));
    }

    #[test]
    fn abandon_drops_queued_and_in_flight() {
        let mut s = Scheduler::new(2);
        let (_a, mut ra, _) = submit(&mut s, Priority::High);
        let (_b, _rb, _) = submit(&mut s, Priority::High);
        let (_c, mut rc, _) = submit(&mut s, Priority::Low);

        assert_eq!(s.abandon_all(), (1, 2));
        assert_eq!(ra.try_recv().unwrap_err(), TryRecvError::Closed);
        assert_eq!(rc.try_recv().unwrap_err(), TryRecvError::Closed);
        assert_eq!(s.queued(), 0);
        assert_eq!(s.in_flight(), 0);
    }

    #[test]
    fn end_to_end_reservation_scenario() {
        let mut s = Scheduler::new(4);
        let highs: Vec<_> = (0..3).map(|_| submit(&mut s, Priority::High)).collect();
        assert_eq!(s.stats().busy, 3);

        let (low, mut rl, dl) = submit(&mut s, Priority::Low);
        assert!(dl.is_empty());
        assert_eq!(s.queued(), 1);

        let (first_id, _, first_dispatch) = &highs[0];
        let d = s.handle_response(first_dispatch[0].worker, validated(*first_id, 1));
        assert_eq!(dispatched_ids(&d), vec![low]);
        let low_worker = d[0].worker;

        s.handle_response(low_worker, validated(low, 2));
        assert!(rl.try_recv().unwrap().is_ok());

        for (id, _, dispatches) in &highs[1..] {
            s.handle_response(dispatches[0].worker, validated(*id, 0));
        }

        let stats = s.stats();
        assert_eq!(stats.busy, 0);
        assert_eq!(stats.queued, 0);
        assert!(stats.is_quiescent());
    }
}
