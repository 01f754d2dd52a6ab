//! puzzle-pool: a fixed-size worker pool for CPU-bound puzzle tasks.
//!
//! Callers submit solve, generate and validate requests at `High` or `Low`
//! priority and await a `TaskHandle`. A single coordinator task owns the
//! queue and worker slots; workers run on their own threads.
//!
//! - `pool`: `Pool` and `TaskHandle`, the caller-facing API
//! - `scheduler`: queue, slot states and the dispatch policy
//! - `orchestrator`: the coordinator event loop
//! - `worker`: worker handles, spawners and the thread worker loop
//! - `bridge::protocol`: messages between coordinator and workers

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
mod orchestrator;
pub mod pool;
pub mod scheduler;
pub mod stats;
pub mod worker;

pub use bridge::protocol::{Priority, TaskId, TaskKind, TaskOutput, TaskRequest, WorkerId};
pub use config::PoolConfig;
pub use engine::SudokuEngine;
pub use error::{PoolError, TaskError};
pub use pool::{Pool, TaskHandle};
pub use stats::{PoolHealth, PoolStats};
pub use worker::{Engine, SpawnError, ThreadSpawner, WorkerSpawner};

pub use sudoku_engine::{Board, Difficulty, Puzzle, Validation};
