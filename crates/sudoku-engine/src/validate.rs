use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::{Board, UNITS};
use crate::solver;

/// Result of checking a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Cells whose digit repeats within a row, column or box (sorted).
    pub conflicts: Vec<usize>,
    /// Solutions found, capped at 2. Always 0 when there are conflicts.
    pub solutions: usize,
}

impl Validation {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn is_unique(&self) -> bool {
        self.solutions == 1
    }
}

/// Cells involved in a duplicate digit within any unit.
pub fn conflicts(board: &Board) -> Vec<usize> {
    let mut found = BTreeSet::new();
    for unit in UNITS.iter() {
        let mut seen: [Option<usize>; 10] = [None; 10];
        for &cell in unit {
            let value = board.get(cell) as usize;
            if value == 0 {
                continue;
            }
            if let Some(first) = seen[value] {
                found.insert(first);
                found.insert(cell);
            } else {
                seen[value] = Some(cell);
            }
        }
    }
    found.into_iter().collect()
}

pub fn validate(board: &Board) -> Validation {
    let conflicts = conflicts(board);
    let solutions = if conflicts.is_empty() {
        solver::count_solutions(board, 2)
    } else {
        0
    };
    Validation {
        conflicts,
        solutions,
    }
}
