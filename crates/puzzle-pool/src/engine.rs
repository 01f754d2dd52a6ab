//! Default engine: runs tasks on `sudoku-engine`.

use sudoku_engine::{generate, validate};

use crate::bridge::protocol::{TaskOutput, TaskRequest};
use crate::worker::Engine;

#[derive(Debug, Clone, Copy, Default)]
pub struct SudokuEngine;

impl Engine for SudokuEngine {
    fn run(&self, request: &TaskRequest) -> Result<TaskOutput, String> {
        match request {
            TaskRequest::Solve { board } => sudoku_engine::solve_board(board)
                .map(|board| TaskOutput::Solved { board })
                .map_err(|e| e.to_string()),
            TaskRequest::Generate { difficulty } => Ok(TaskOutput::Generated(
                generate::generate(*difficulty, &mut rand::thread_rng()),
            )),
            TaskRequest::Validate { board } => Ok(TaskOutput::Validated(validate::validate(board))),
        }
    }
}
