//! Point-in-time view of pool occupancy.

use serde::{Deserialize, Serialize};

/// Coarse pool state derived from a stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolHealth {
    /// At least one worker is free
    Ready,
    /// Every live worker is running a task
    Busy,
    /// No live workers remain
    Defunct,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Number of worker slots the pool was built with.
    pub size: usize,
    pub idle: usize,
    pub busy: usize,
    /// Slots whose worker stopped accepting requests.
    pub poisoned: usize,
    /// Tasks waiting for a worker.
    pub queued: usize,
    /// Tasks dispatched and awaiting a response.
    pub in_flight: usize,
}

impl PoolStats {
    pub fn health(&self) -> PoolHealth {
        if self.poisoned == self.size {
            PoolHealth::Defunct
        } else if self.idle == 0 {
            PoolHealth::Busy
        } else {
            PoolHealth::Ready
        }
    }

    /// No queued or running work.
    pub fn is_quiescent(&self) -> bool {
        self.busy == 0 && self.queued == 0 && self.in_flight == 0
    }
}
