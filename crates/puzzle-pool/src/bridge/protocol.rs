//! Wire protocol types for coordinator-worker communication.
//!
//! - **WorkerRequest**: `{ id, type, ...kind fields }`, sent to one worker
//! - **WorkerResponse**: `{ id, status, payload?, error? }`, sent back
//!
//! The response `id` echoes the request `id`. That echo is the only
//! correlation mechanism; arrival order carries no meaning.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sudoku_engine::{Board, Difficulty, Puzzle, Validation};

/// Unique, monotonically increasing task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a worker slot, `0..N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(usize);

impl WorkerId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task urgency. Sorts `High` before `Low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// User-initiated, latency-sensitive work.
    #[default]
    High,
    /// Background work; never takes the last free worker.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Low => f.write_str("low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Solve,
    Generate,
    Validate,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solve => f.write_str("solve"),
            Self::Generate => f.write_str("generate"),
            Self::Validate => f.write_str("validate"),
        }
    }
}

/// The computation a task asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskRequest {
    Solve { board: Board },
    Generate { difficulty: Difficulty },
    Validate { board: Board },
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Solve { .. } => TaskKind::Solve,
            Self::Generate { .. } => TaskKind::Generate,
            Self::Validate { .. } => TaskKind::Validate,
        }
    }
}

/// Successful result of a task. Each variant answers exactly one `TaskKind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskOutput {
    Solved { board: Board },
    Generated(Puzzle),
    Validated(Validation),
}

impl TaskOutput {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Solved { .. } => TaskKind::Solve,
            Self::Generated(_) => TaskKind::Generate,
            Self::Validated(_) => TaskKind::Validate,
        }
    }
}

/// Message from coordinator to worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: TaskId,
    #[serde(flatten)]
    pub task: TaskRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Message from worker to coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: TaskId,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TaskOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResponse {
    pub fn success(id: TaskId, payload: TaskOutput) -> Self {
        Self {
            id,
            status: ResponseStatus::Success,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(id: TaskId, error: impl Into<String>) -> Self {
        Self {
            id,
            status: ResponseStatus::Error,
            payload: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str =
        "530070000600195000098000060800060003400803001700020006060000280000419005000080079";

    fn board() -> Board {
        BOARD.parse().unwrap()
    }

    #[test]
    fn priority_orders_high_first() {
        assert!(Priority::High < Priority::Low);
        assert_eq!(Priority::default(), Priority::High);
    }

    #[test]
    fn task_ids_increase() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
    }

    #[test]
    fn solve_request_serializes() {
        let req = WorkerRequest {
            id: TaskId::from_raw(7),
            task: TaskRequest::Solve { board: board() },
        };
        insta::assert_json_snapshot!(req, @r#"
        {
          "id": 7,
          "type": "solve",
          "board": "530070000600195000098000060800060003400803001700020006060000280000419005000080079"
        }
        "#);
    }

    #[test]
    fn generate_request_serializes() {
        let req = WorkerRequest {
            id: TaskId::from_raw(8),
            task: TaskRequest::Generate {
                difficulty: Difficulty::Hard,
            },
        };
        insta::assert_json_snapshot!(req, @r#"
        {
          "id": 8,
          "type": "generate",
          "difficulty": "hard"
        }
        "#);
    }

    #[test]
    fn error_response_serializes() {
        let resp = WorkerResponse::error(TaskId::from_raw(3), "board has no solution");
        insta::assert_json_snapshot!(resp, @r#"
        {
          "id": 3,
          "status": "error",
          "error": "board has no solution"
        }
        "#);
    }

    #[test]
    fn validated_response_serializes() {
        let resp = WorkerResponse::success(
            TaskId::from_raw(9),
            TaskOutput::Validated(Validation {
                conflicts: vec![],
                solutions: 1,
            }),
        );
        insta::assert_json_snapshot!(resp, @r#"
        {
          "id": 9,
          "status": "success",
          "payload": {
            "type": "validated",
            "conflicts": [],
            "solutions": 1
          }
        }
        "#);
    }

    #[test]
    fn request_deserializes_from_wire() {
        let json = format!(r#"{{"id": 4, "type": "validate", "board": "{BOARD}"}}"#);
        let req: WorkerRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.id, TaskId::from_raw(4));
        assert_eq!(req.task, TaskRequest::Validate { board: board() });
        assert_eq!(req.task.kind(), TaskKind::Validate);
    }

    #[test]
    fn error_response_without_message_deserializes() {
        let resp: WorkerResponse = serde_json::from_str(r#"{"id": 5, "status": "error"}"#).unwrap();
        assert_eq!(resp.status, ResponseStatus::Error);
        assert!(resp.error.is_none());
        assert!(resp.payload.is_none());
    }

    #[test]
    fn unknown_task_type_is_rejected() {
        let err = serde_json::from_str::<WorkerRequest>(r#"{"id": 1, "type": "hint"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn generated_payload_round_trips_kind() {
        let puzzle = Puzzle {
            difficulty: Difficulty::Easy,
            puzzle: board(),
            solution: board(),
        };
        let json = serde_json::to_value(TaskOutput::Generated(puzzle)).unwrap();
        assert_eq!(json["type"], "generated");
        assert_eq!(json["difficulty"], "easy");
        let back: TaskOutput = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), TaskKind::Generate);
    }
}
