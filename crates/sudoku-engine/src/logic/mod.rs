//! Human-style solving over candidate marks.
//!
//! `solve_with_steps` repeatedly applies the first technique that makes
//! progress, cheapest first, and records each step. The hardest technique a
//! puzzle needed is its grade; generation uses it to sort puzzles into
//! difficulties.
//!
//! Technique finders are pure: they inspect a `CandidateGrid` and describe a
//! step, and only `CandidateGrid::apply` changes the grid.

mod fish;
mod intersections;
mod single_digit;
mod singles;
mod subsets;
mod uniqueness;
mod wings;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, CELLS, PEERS, box_of};

/// Candidate mask with all nine digits set.
pub const ALL_CANDIDATES: u16 = 0b1_1111_1111;

/// How hard a technique is for a human solver. Ordered from easiest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TechniqueLevel {
    /// No technique applied.
    #[default]
    None,
    Basic,
    Intermediate,
    Advanced,
    Master,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technique {
    NakedSingle,
    HiddenSingle,
    NakedPair,
    NakedTriple,
    HiddenPair,
    HiddenTriple,
    PointingPair,
    PointingTriple,
    ClaimingCandidate,
    #[serde(rename = "X-Wing")]
    XWing,
    Swordfish,
    Jellyfish,
    #[serde(rename = "XY-Wing")]
    XyWing,
    #[serde(rename = "XYZ-Wing")]
    XyzWing,
    Skyscraper,
    TwoStringKite,
    UniqueRectangleType1,
    #[serde(rename = "W-Wing")]
    WWing,
}

impl Technique {
    pub fn level(&self) -> TechniqueLevel {
        match self {
            Self::NakedSingle | Self::HiddenSingle => TechniqueLevel::Basic,
            Self::NakedPair
            | Self::NakedTriple
            | Self::HiddenPair
            | Self::HiddenTriple
            | Self::PointingPair
            | Self::PointingTriple
            | Self::ClaimingCandidate => TechniqueLevel::Intermediate,
            Self::XWing
            | Self::Swordfish
            | Self::XyWing
            | Self::XyzWing
            | Self::Skyscraper
            | Self::TwoStringKite => TechniqueLevel::Advanced,
            Self::Jellyfish | Self::UniqueRectangleType1 | Self::WWing => TechniqueLevel::Master,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NakedSingle => "NakedSingle",
            Self::HiddenSingle => "HiddenSingle",
            Self::NakedPair => "NakedPair",
            Self::NakedTriple => "NakedTriple",
            Self::HiddenPair => "HiddenPair",
            Self::HiddenTriple => "HiddenTriple",
            Self::PointingPair => "PointingPair",
            Self::PointingTriple => "PointingTriple",
            Self::ClaimingCandidate => "ClaimingCandidate",
            Self::XWing => "X-Wing",
            Self::Swordfish => "Swordfish",
            Self::Jellyfish => "Jellyfish",
            Self::XyWing => "XY-Wing",
            Self::XyzWing => "XYZ-Wing",
            Self::Skyscraper => "Skyscraper",
            Self::TwoStringKite => "TwoStringKite",
            Self::UniqueRectangleType1 => "UniqueRectangleType1",
            Self::WWing => "W-Wing",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub index: usize,
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub index: usize,
    pub value: u8,
}

/// A cell whose candidates justify a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseCell {
    pub index: usize,
    pub candidates: Vec<u8>,
}

/// One deduction: digits placed, candidates removed, and the cells that
/// made it possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvingStep {
    pub technique: Technique,
    pub placements: Vec<Placement>,
    pub eliminations: Vec<Elimination>,
    pub cause: Vec<CauseCell>,
}

impl SolvingStep {
    /// An elimination-only step, or `None` when it would remove nothing.
    pub(crate) fn eliminating(
        technique: Technique,
        eliminations: Vec<Elimination>,
        cause: Vec<CauseCell>,
    ) -> Option<Self> {
        if eliminations.is_empty() {
            return None;
        }
        Some(Self {
            technique,
            placements: Vec::new(),
            eliminations,
            cause,
        })
    }
}

/// Technique counts for a solve path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyStats {
    pub max_level: TechniqueLevel,
    pub intermediate_count: usize,
    pub advanced_count: usize,
    pub master_count: usize,
}

/// Board values plus the remaining candidates of every empty cell.
/// A filled cell has no candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateGrid {
    cells: [u8; CELLS],
    candidates: [u16; CELLS],
}

impl CandidateGrid {
    pub fn from_board(board: &Board) -> Self {
        let mut grid = Self {
            cells: *board.cells(),
            candidates: [0; CELLS],
        };
        for index in 0..CELLS {
            if grid.cells[index] == 0 {
                grid.candidates[index] = ALL_CANDIDATES;
            }
        }
        for index in 0..CELLS {
            let value = grid.cells[index];
            if value != 0 {
                grid.clear_from_peers(index, value);
            }
        }
        grid
    }

    pub fn value(&self, index: usize) -> u8 {
        self.cells[index]
    }

    /// Candidate mask of `index`; bit `d - 1` set means `d` is still possible.
    pub fn candidates(&self, index: usize) -> u16 {
        self.candidates[index]
    }

    pub fn is_empty(&self, index: usize) -> bool {
        self.cells[index] == 0
    }

    /// Whether `digit` is still a candidate of the empty cell `index`.
    pub fn has(&self, index: usize, digit: u8) -> bool {
        self.cells[index] == 0 && self.candidates[index] & bit(digit) != 0
    }

    /// Place `value` and remove it from every peer. Returns `false` if the
    /// cell was already filled.
    pub fn place(&mut self, index: usize, value: u8) -> bool {
        if self.cells[index] != 0 {
            return false;
        }
        self.cells[index] = value;
        self.candidates[index] = 0;
        self.clear_from_peers(index, value);
        true
    }

    pub fn eliminate(&mut self, index: usize, value: u8) {
        self.candidates[index] &= !bit(value);
    }

    /// Placements first, then eliminations.
    pub fn apply(&mut self, step: &SolvingStep) {
        for placement in &step.placements {
            self.place(placement.index, placement.value);
        }
        for elimination in &step.eliminations {
            self.eliminate(elimination.index, elimination.value);
        }
    }

    pub fn is_solved(&self) -> bool {
        self.cells.iter().all(|&c| c != 0)
    }

    pub fn to_board(&self) -> Board {
        Board::from_cells_unchecked(self.cells)
    }

    fn clear_from_peers(&mut self, index: usize, value: u8) {
        for &peer in &PEERS[index] {
            self.candidates[peer] &= !bit(value);
        }
    }

    /// Where each digit may still go, per line: `rows[d][r]` has bit `c` set
    /// when `d` is a candidate at row `r`, column `c`; `cols[d][c]` likewise
    /// has bit `r` set.
    fn line_masks(&self) -> ([[u16; 9]; 10], [[u16; 9]; 10]) {
        let mut rows = [[0u16; 9]; 10];
        let mut cols = [[0u16; 9]; 10];
        for index in 0..CELLS {
            if self.cells[index] != 0 {
                continue;
            }
            let (r, c) = (index / 9, index % 9);
            for digit in digits(self.candidates[index]) {
                rows[digit as usize][r] |= 1 << c;
                cols[digit as usize][c] |= 1 << r;
            }
        }
        (rows, cols)
    }
}

type Finder = fn(&CandidateGrid) -> Option<SolvingStep>;

/// Finders in the order they are tried.
const FINDERS: [Finder; 15] = [
    singles::naked_single,
    singles::hidden_single,
    subsets::naked_pair,
    subsets::naked_triple,
    intersections::pointing,
    subsets::hidden_pair,
    subsets::hidden_triple,
    intersections::claiming,
    fish::fish,
    wings::xy_wing,
    wings::xyz_wing,
    single_digit::skyscraper,
    single_digit::two_string_kite,
    uniqueness::unique_rectangle_type1,
    wings::w_wing,
];

/// The next step, from the cheapest technique that applies.
pub fn next_step(grid: &CandidateGrid) -> Option<SolvingStep> {
    FINDERS.iter().find_map(|finder| finder(grid))
}

/// Solve as far as logic allows. Returns the steps taken and the resulting
/// board, which still has empty cells when the techniques ran out.
pub fn solve_with_steps(board: &Board) -> (Vec<SolvingStep>, Board) {
    let mut grid = CandidateGrid::from_board(board);
    let mut steps = Vec::new();
    while let Some(step) = next_step(&grid) {
        grid.apply(&step);
        steps.push(step);
    }
    (steps, grid.to_board())
}

pub fn analyze_difficulty(steps: &[SolvingStep]) -> DifficultyStats {
    let mut stats = DifficultyStats::default();
    for step in steps {
        let level = step.technique.level();
        stats.max_level = stats.max_level.max(level);
        match level {
            TechniqueLevel::Intermediate => stats.intermediate_count += 1,
            TechniqueLevel::Advanced => stats.advanced_count += 1,
            TechniqueLevel::Master => stats.master_count += 1,
            TechniqueLevel::None | TechniqueLevel::Basic => {}
        }
    }
    stats
}

/// Hardest technique needed, and the board as far as logic got.
pub fn grade(board: &Board) -> (TechniqueLevel, Board) {
    let (steps, solved) = solve_with_steps(board);
    (analyze_difficulty(&steps).max_level, solved)
}

pub(crate) fn bit(digit: u8) -> u16 {
    1 << (digit - 1)
}

/// Digits set in `mask`, ascending.
pub(crate) fn digits(mask: u16) -> impl Iterator<Item = u8> {
    (1..=9u8).filter(move |&d| mask & bit(d) != 0)
}

/// Whether two distinct cells share a row, column or box.
pub(crate) fn sees(a: usize, b: usize) -> bool {
    a != b && (a / 9 == b / 9 || a % 9 == b % 9 || box_of(a) == box_of(b))
}

/// Cells that see both `a` and `b` and still hold `digit`, as eliminations.
pub(crate) fn common_peer_eliminations(
    grid: &CandidateGrid,
    a: usize,
    b: usize,
    digit: u8,
) -> Vec<Elimination> {
    PEERS[a]
        .iter()
        .copied()
        .filter(|&i| grid.has(i, digit) && sees(i, b))
        .map(|index| Elimination {
            index,
            value: digit,
        })
        .collect()
}

/// Each cell of `cells` as a cause holding only `digit`.
pub(crate) fn digit_cause(cells: &[usize], digit: u8) -> Vec<CauseCell> {
    cells
        .iter()
        .map(|&index| CauseCell {
            index,
            candidates: vec![digit],
        })
        .collect()
}

/// First `size`-element combination of `items`, in lexicographic order, for
/// which `f` returns a value.
pub(crate) fn find_combination<T: Copy, R>(
    items: &[T],
    size: usize,
    mut f: impl FnMut(&[T]) -> Option<R>,
) -> Option<R> {
    fn extend<T: Copy, R>(
        items: &[T],
        size: usize,
        start: usize,
        combo: &mut Vec<T>,
        f: &mut dyn FnMut(&[T]) -> Option<R>,
    ) -> Option<R> {
        if combo.len() == size {
            return f(combo);
        }
        for i in start..items.len() {
            combo.push(items[i]);
            if let Some(found) = extend(items, size, i + 1, combo, f) {
                return Some(found);
            }
            combo.pop();
        }
        None
    }
    extend(items, size, 0, &mut Vec::with_capacity(size), &mut f)
}
