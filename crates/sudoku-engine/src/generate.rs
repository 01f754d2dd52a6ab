//! Puzzle generation graded by solving technique.
//!
//! Each attempt fills a random grid, removes clues in random order while the
//! solution stays unique, and grades the resulting minimal puzzle with the
//! logical solver. Attempts repeat until the grade matches the difficulty.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::board::{Board, CELLS};
use crate::logic::{self, TechniqueLevel};
use crate::solver;

/// Target difficulty of a generated puzzle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    /// Whether a puzzle whose hardest technique is `level` belongs here.
    /// `solved` says whether the techniques completed the puzzle.
    pub fn accepts(&self, level: TechniqueLevel, solved: bool) -> bool {
        match self {
            Self::Easy => solved && level == TechniqueLevel::Basic,
            Self::Medium => solved && level == TechniqueLevel::Intermediate,
            Self::Hard => solved && level == TechniqueLevel::Advanced,
            Self::Extreme => !solved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "extreme" => Ok(Self::Extreme),
            other => Err(format!(
                "unknown difficulty '{other}', expected easy, medium, hard or extreme"
            )),
        }
    }
}

/// A generated puzzle together with its unique solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub difficulty: Difficulty,
    pub puzzle: Board,
    pub solution: Board,
}

/// Generate a puzzle with exactly one solution at `difficulty`.
///
/// Easy puzzles need only singles, Medium at most subsets and box/line
/// interactions, Hard at most fish and wings. Extreme puzzles cannot be
/// finished by the logical solver at all.
pub fn generate<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Puzzle {
    loop {
        let mut solution = Board::empty();
        // An empty board always has a completion.
        solver::solve_randomized(&mut solution, rng);
        let puzzle = minimal_puzzle(&solution, rng);

        let (level, reached) = logic::grade(&puzzle);
        if difficulty.accepts(level, reached.is_complete()) {
            return Puzzle {
                difficulty,
                puzzle,
                solution,
            };
        }
    }
}

/// Remove clues from `solution` in random order, undoing any removal that
/// would admit a second solution.
fn minimal_puzzle<R: Rng + ?Sized>(solution: &Board, rng: &mut R) -> Board {
    let mut puzzle = *solution;
    let mut indices: Vec<usize> = (0..CELLS).collect();
    indices.shuffle(rng);

    for index in indices {
        let value = puzzle.get(index);
        puzzle.set(index, 0);
        if solver::count_solutions(&puzzle, 2) != 1 {
            puzzle.set(index, value);
        }
    }
    puzzle
}
