//! WorkerSlot - the coordinator's record of one worker.
//!
//! A slot is `Busy` with exactly one task id while a request is in flight,
//! and any response from its worker frees it.
//! A `Poisoned` slot has lost its worker and never leaves that state.

use crate::bridge::protocol::{TaskId, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Busy(TaskId),
    Poisoned,
}

#[derive(Debug)]
pub(crate) struct WorkerSlot {
    id: WorkerId,
    state: SlotState,
}

impl WorkerSlot {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: SlotState::Idle,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SlotState::Idle
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, SlotState::Busy(_))
    }

    pub fn is_poisoned(&self) -> bool {
        self.state == SlotState::Poisoned
    }

    pub fn assign(&mut self, task: TaskId) {
        debug_assert!(self.is_idle(), "assigning task to non-idle slot");
        if !self.is_idle() {
            tracing::error!(worker = %self.id, state = ?self.state, %task, "Bug: assigning task to non-idle slot");
            return;
        }
        self.state = SlotState::Busy(task);
    }

    /// Free a busy slot, whatever task it was running. Returns that task, or
    /// `None` if the slot was idle or poisoned (both left unchanged).
    pub fn release(&mut self) -> Option<TaskId> {
        match self.state {
            SlotState::Busy(current) => {
                self.state = SlotState::Idle;
                Some(current)
            }
            _ => None,
        }
    }

    pub fn poison(&mut self) {
        if !self.is_poisoned() {
            tracing::warn!(worker = %self.id, "Worker slot poisoned - capacity reduced");
        }
        self.state = SlotState::Poisoned;
    }
}
