//! sudoku-engine: the computation behind puzzle-pool workers.
//!
//! Everything here is synchronous and CPU-bound; scheduling lives in `puzzle-pool`.

pub mod board;
pub mod error;
pub mod generate;
pub mod logic;
pub mod solver;
pub mod validate;

pub use board::Board;
pub use error::EngineError;
pub use generate::{Difficulty, Puzzle};
pub use logic::{SolvingStep, Technique, TechniqueLevel, analyze_difficulty, solve_with_steps};
pub use validate::Validation;

use crate::error::Result;

/// Solve a board, distinguishing conflicting clues from boards with no completion.
pub fn solve_board(board: &Board) -> Result<Board> {
    let conflicts = validate::conflicts(board);
    if !conflicts.is_empty() {
        return Err(EngineError::Conflicting(conflicts));
    }
    solver::solve(board).ok_or(EngineError::Unsolvable)
}
