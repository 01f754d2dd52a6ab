//! 9x9 board representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const CELLS: usize = 81;

/// The 27 units of the grid: 9 rows, then 9 columns, then 9 boxes.
pub static UNITS: [[usize; 9]; 27] = build_units();

const fn build_units() -> [[usize; 9]; 27] {
    let mut units = [[0; 9]; 27];
    let mut i = 0;
    while i < 9 {
        let mut j = 0;
        while j < 9 {
            units[i][j] = i * 9 + j;
            units[9 + i][j] = j * 9 + i;
            units[18 + i][j] = ((i / 3) * 3 + j / 3) * 9 + (i % 3) * 3 + j % 3;
            j += 1;
        }
        i += 1;
    }
    units
}

/// For each cell, the 20 other cells sharing its row, column or box, ascending.
pub static PEERS: [[usize; 20]; CELLS] = build_peers();

const fn build_peers() -> [[usize; 20]; CELLS] {
    let mut peers = [[0; 20]; CELLS];
    let mut i = 0;
    while i < CELLS {
        let mut n = 0;
        let mut j = 0;
        while j < CELLS {
            if j != i && (j / 9 == i / 9 || j % 9 == i % 9 || box_of(j) == box_of(i)) {
                peers[i][n] = j;
                n += 1;
            }
            j += 1;
        }
        i += 1;
    }
    peers
}

/// Index of the 3x3 box containing `index`.
pub const fn box_of(index: usize) -> usize {
    (index / 27) * 3 + (index % 9) / 3
}

/// A Sudoku board. `0` marks an empty cell.
///
/// Serialized as an 81-character digit string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Board {
    cells: [u8; CELLS],
}

impl Board {
    pub fn empty() -> Self {
        Self { cells: [0; CELLS] }
    }

    pub fn from_cells(cells: [u8; CELLS]) -> Result<Self> {
        if let Some((index, &value)) = cells.iter().enumerate().find(|(_, v)| **v > 9) {
            return Err(EngineError::InvalidValue { value, index });
        }
        Ok(Self { cells })
    }

    /// Every value must already be in `0..=9`.
    pub(crate) const fn from_cells_unchecked(cells: [u8; CELLS]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[u8; CELLS] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> u8 {
        self.cells[index]
    }

    /// Panics if `index` is out of range or `value > 9`. See `try_set`.
    pub fn set(&mut self, index: usize, value: u8) {
        assert!(value <= 9, "cell value out of range: {value}");
        self.cells[index] = value;
    }

    /// Like `set`, but reports a bad index or value instead of panicking.
    pub fn try_set(&mut self, index: usize, value: u8) -> Result<()> {
        if value > 9 {
            return Err(EngineError::InvalidValue { value, index });
        }
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(EngineError::InvalidIndex(index))?;
        *cell = value;
        Ok(())
    }

    pub fn clue_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|&c| c != 0)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromStr for Board {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cells = [0u8; CELLS];
        let mut count = 0;
        for ch in s.chars().filter(|c| !c.is_whitespace()) {
            let value = match ch {
                '.' | '0' => 0,
                '1'..='9' => ch as u8 - b'0',
                _ => return Err(EngineError::InvalidCharacter { ch, index: count }),
            };
            if count < CELLS {
                cells[count] = value;
            }
            count += 1;
        }
        if count != CELLS {
            return Err(EngineError::InvalidLength(count));
        }
        Ok(Self { cells })
    }
}

impl TryFrom<String> for Board {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in &self.cells {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in self.cells.chunks(9) {
            let line: String = row
                .iter()
                .map(|&c| if c == 0 { '.' } else { (b'0' + c) as char })
                .collect();
            writeln!(f, "    {line}")?;
        }
        write!(f, "}}")
    }
}
