//! Coordinator state: task queue, worker slots and pending completions.
//!
//! - `queue`: pending tasks, priority order, FIFO within a priority
//! - `slot`: per-worker `Idle` / `Busy(task)` / `Poisoned` state
//! - `dispatch`: the `Scheduler` tying them together with the reservation policy

mod dispatch;
mod queue;
mod slot;

pub use dispatch::{Dispatch, Scheduler};
pub use queue::{Completion, Task};
pub use slot::SlotState;
