//! Pool configuration and sizing.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::worker::{ThreadSpawner, WorkerSpawner};

/// Pool size used when no concurrency hint is available.
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const MIN_WORKERS: usize = 2;
pub const MAX_WORKERS: usize = 6;

/// Environment variable overriding the detected concurrency hint.
pub const CONCURRENCY_ENV: &str = "PUZZLE_POOL_CONCURRENCY";

/// Number of workers for a given concurrency hint, always within
/// `[MIN_WORKERS, MAX_WORKERS]`.
pub fn pool_size(hint: Option<usize>) -> usize {
    hint.unwrap_or(DEFAULT_CONCURRENCY)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

pub struct PoolConfig {
    pub concurrency_hint: Option<usize>,
    pub spawner: Arc<dyn WorkerSpawner>,
}

impl PoolConfig {
    /// No hint (default size) and thread workers running the sudoku engine.
    pub fn new() -> Self {
        Self {
            concurrency_hint: None,
            spawner: Arc::new(ThreadSpawner::default()),
        }
    }

    /// Hint from `PUZZLE_POOL_CONCURRENCY`, else the machine's available parallelism.
    pub fn from_env() -> Self {
        let hint = std::env::var(CONCURRENCY_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .or_else(|| {
                std::thread::available_parallelism()
                    .ok()
                    .map(NonZeroUsize::get)
            });
        Self::new().with_concurrency_hint(hint)
    }

    pub fn with_concurrency_hint(mut self, hint: Option<usize>) -> Self {
        self.concurrency_hint = hint;
        self
    }

    pub fn with_spawner(mut self, spawner: Arc<dyn WorkerSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn pool_size(&self) -> usize {
        pool_size(self.concurrency_hint)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
