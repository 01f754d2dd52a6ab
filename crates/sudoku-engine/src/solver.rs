//! Backtracking solver over per-unit candidate bitmasks.
//!
//! The search always branches on the empty cell with the fewest candidates,
//! which keeps uniqueness checks cheap enough to run once per removed clue
//! during generation.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::board::{Board, CELLS, box_of};

const ALL_DIGITS: u16 = 0b1_1111_1111;

struct Grid {
    cells: [u8; CELLS],
    rows: [u16; 9],
    cols: [u16; 9],
    boxes: [u16; 9],
}

impl Grid {
    /// Returns `None` when the givens already conflict.
    fn new(board: &Board) -> Option<Self> {
        let mut grid = Self {
            cells: [0; CELLS],
            rows: [0; 9],
            cols: [0; 9],
            boxes: [0; 9],
        };
        for (index, &value) in board.cells().iter().enumerate() {
            if value == 0 {
                continue;
            }
            if grid.candidates(index) & bit(value) == 0 {
                return None;
            }
            grid.place(index, value);
        }
        Some(grid)
    }

    fn candidates(&self, index: usize) -> u16 {
        let used = self.rows[index / 9] | self.cols[index % 9] | self.boxes[box_of(index)];
        !used & ALL_DIGITS
    }

    fn place(&mut self, index: usize, value: u8) {
        let b = bit(value);
        self.cells[index] = value;
        self.rows[index / 9] |= b;
        self.cols[index % 9] |= b;
        self.boxes[box_of(index)] |= b;
    }

    fn clear(&mut self, index: usize) {
        let b = bit(self.cells[index]);
        self.cells[index] = 0;
        self.rows[index / 9] &= !b;
        self.cols[index % 9] &= !b;
        self.boxes[box_of(index)] &= !b;
    }

    /// The empty cell with the fewest candidates, or `None` if the grid is full.
    fn most_constrained(&self) -> Option<(usize, u16)> {
        let mut best: Option<(usize, u16)> = None;
        for index in 0..CELLS {
            if self.cells[index] != 0 {
                continue;
            }
            let mask = self.candidates(index);
            let count = mask.count_ones();
            if count <= 1 {
                return Some((index, mask));
            }
            if best.is_none_or(|(_, m)| count < m.count_ones()) {
                best = Some((index, mask));
            }
        }
        best
    }
}

fn bit(value: u8) -> u16 {
    1 << (value - 1)
}

/// Depth-first search. `on_solution` returns `true` to stop the search.
fn search<F>(grid: &mut Grid, digits: &[u8; 9], on_solution: &mut F) -> bool
where
    F: FnMut(&[u8; CELLS]) -> bool,
{
    let Some((index, mask)) = grid.most_constrained() else {
        return on_solution(&grid.cells);
    };
    for &digit in digits {
        if mask & bit(digit) == 0 {
            continue;
        }
        grid.place(index, digit);
        if search(grid, digits, on_solution) {
            return true;
        }
        grid.clear(index);
    }
    false
}

const ORDERED: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

/// First solution found, or `None` if the board has no solution.
pub fn solve(board: &Board) -> Option<Board> {
    let mut grid = Grid::new(board)?;
    let mut solution = None;
    search(&mut grid, &ORDERED, &mut |cells| {
        solution = Some(*cells);
        true
    });
    solution.and_then(|cells| Board::from_cells(cells).ok())
}

/// Number of solutions, counting at most `limit`.
pub fn count_solutions(board: &Board, limit: usize) -> usize {
    let Some(mut grid) = Grid::new(board) else {
        return 0;
    };
    if limit == 0 {
        return 0;
    }
    let mut count = 0;
    search(&mut grid, &ORDERED, &mut |_| {
        count += 1;
        count >= limit
    });
    count
}

/// Fills every empty cell using a shuffled digit order. Returns `false` (and
/// leaves the board untouched) when the board cannot be completed.
pub fn solve_randomized<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> bool {
    let Some(mut grid) = Grid::new(board) else {
        return false;
    };
    let mut digits = ORDERED;
    digits.shuffle(rng);
    let mut solution = None;
    search(&mut grid, &digits, &mut |cells| {
        solution = Some(*cells);
        true
    });
    match solution.map(Board::from_cells) {
        Some(Ok(solved)) => {
            *board = solved;
            true
        }
        _ => false,
    }
}
