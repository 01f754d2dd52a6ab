//! Orchestrator - owns the scheduler and runs the coordinator event loop.
//!
//! Flow:
//! 1. Spawn one worker per slot, all reporting into one response channel
//! 2. Process submissions and worker responses strictly one at a time
//! 3. Deliver each resulting dispatch to its worker
//! 4. On shutdown: abandon queued and in-flight tasks, release all workers
//!
//! Only this task touches the queue, slot states and pending completions,
//! so none of them need a lock.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::bridge::protocol::{WorkerId, WorkerResponse};
use crate::error::PoolError;
use crate::scheduler::{Completion, Dispatch, Scheduler, Task};
use crate::stats::PoolStats;
use crate::worker::{ResponseSender, WorkerHandle, WorkerSpawner};

/// Requests from `Pool` handles to the event loop.
pub(crate) enum Command {
    Submit { task: Task, completion: Completion },
    Stats { reply: oneshot::Sender<PoolStats> },
}

/// Spawn `size` workers. Any failure releases the workers started so far.
pub(crate) fn spawn_workers(
    size: usize,
    spawner: &dyn WorkerSpawner,
    responses: &ResponseSender,
) -> Result<Vec<WorkerHandle>, PoolError> {
    let mut workers = Vec::with_capacity(size);
    for index in 0..size {
        let id = WorkerId::new(index);
        match spawner.spawn(id, responses.clone()) {
            Ok(handle) => workers.push(handle),
            Err(source) => {
                tracing::error!(worker = %id, error = %source, "Failed to start worker");
                return Err(PoolError::Spawn {
                    worker: index,
                    source,
                });
            }
        }
    }
    Ok(workers)
}

pub(crate) async fn run_event_loop(
    mut scheduler: Scheduler,
    workers: Vec<WorkerHandle>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut responses: mpsc::UnboundedReceiver<(WorkerId, WorkerResponse)>,
    shutdown: CancellationToken,
) {
    tracing::debug!(size = scheduler.size(), "Event loop started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                tracing::debug!("Shutdown requested");
                break;
            }

            Some((from, response)) = responses.recv() => {
                let dispatches = scheduler.handle_response(from, response);
                deliver(&mut scheduler, &workers, dispatches);
            }

            command = commands.recv() => {
                match command {
                    Some(Command::Submit { task, completion }) => {
                        let dispatches = scheduler.submit(task, completion);
                        deliver(&mut scheduler, &workers, dispatches);
                    }
                    Some(Command::Stats { reply }) => {
                        let _ = reply.send(scheduler.stats());
                    }
                    None => {
                        tracing::debug!("All pool handles dropped");
                        break;
                    }
                }
            }
        }
    }

    let (queued, in_flight) = scheduler.abandon_all();
    if queued > 0 || in_flight > 0 {
        tracing::warn!(queued, in_flight, "Abandoning unfinished tasks");
    }
    drop(workers);
    tracing::info!("Event loop exiting");
}

/// Send dispatches to their workers. A worker that can no longer receive is
/// poisoned and its task failed, which may free further dispatches.
fn deliver(scheduler: &mut Scheduler, workers: &[WorkerHandle], mut dispatches: Vec<Dispatch>) {
    while !dispatches.is_empty() {
        let mut follow_up = Vec::new();
        for Dispatch { worker, request } in dispatches {
            let id = request.id;
            let sent = match workers.get(worker.index()) {
                Some(handle) => handle.send(request).map_err(|e| e.to_string()),
                None => Err(format!("no handle for worker {worker}")),
            };
            if let Err(error) = sent {
                tracing::error!(%worker, task_id = %id, %error, "Failed to deliver task");
                follow_up.extend(scheduler.dispatch_failed(worker, id));
            }
        }
        dispatches = follow_up;
    }
}
