//! Single-digit patterns built from conjugate pairs: Skyscraper and
//! Two-String Kite.

use crate::board::box_of;

use super::{
    CandidateGrid, SolvingStep, Technique, common_peer_eliminations, digit_cause, digits,
};

/// Two parallel lines holding the digit exactly twice, with one end of each
/// on a shared cross line. The other ends (the roof) cannot both be false,
/// so cells seeing both roof cells lose the digit.
pub(super) fn skyscraper(grid: &CandidateGrid) -> Option<SolvingStep> {
    let (rows, cols) = grid.line_masks();
    for digit in 1..=9u8 {
        for (masks, by_rows) in [(&rows[digit as usize], true), (&cols[digit as usize], false)] {
            let pairs: Vec<usize> = (0..9).filter(|&l| masks[l].count_ones() == 2).collect();
            for (i, &a) in pairs.iter().enumerate() {
                for &b in &pairs[i + 1..] {
                    let shared = masks[a] & masks[b];
                    if shared.count_ones() != 1 {
                        continue;
                    }
                    let at = |line: usize, mask: u16| {
                        let cross = mask.trailing_zeros() as usize;
                        if by_rows { line * 9 + cross } else { cross * 9 + line }
                    };
                    let roof = [at(a, masks[a] & !shared), at(b, masks[b] & !shared)];
                    let base = [at(a, shared), at(b, shared)];

                    let eliminations = common_peer_eliminations(grid, roof[0], roof[1], digit);
                    let cause = digit_cause(&[roof[0], roof[1], base[0], base[1]], digit);
                    if let Some(step) =
                        SolvingStep::eliminating(Technique::Skyscraper, eliminations, cause)
                    {
                        return Some(step);
                    }
                }
            }
        }
    }
    None
}

/// A row and a column each holding the digit exactly twice, with one end of
/// each in the same box. The far ends cannot both be false.
pub(super) fn two_string_kite(grid: &CandidateGrid) -> Option<SolvingStep> {
    let (rows, cols) = grid.line_masks();
    for digit in 1..=9u8 {
        let row_pairs = (0..9).filter(|&r| rows[digit as usize][r].count_ones() == 2);
        for r in row_pairs {
            let row_cells = ends(rows[digit as usize][r]).map(|c| r * 9 + c);
            for c in (0..9).filter(|&c| cols[digit as usize][c].count_ones() == 2) {
                let col_cells = ends(cols[digit as usize][c]).map(|row| row * 9 + c);
                if let Some(step) = kite(grid, digit, row_cells, col_cells) {
                    return Some(step);
                }
            }
        }
    }
    None
}

/// The two positions set in a two-bit line mask, ascending.
fn ends(mask: u16) -> [usize; 2] {
    let mut positions = digits(mask).map(|d| d as usize - 1);
    let first = positions.next().unwrap_or_default();
    let second = positions.next().unwrap_or_default();
    [first, second]
}

fn kite(
    grid: &CandidateGrid,
    digit: u8,
    row_cells: [usize; 2],
    col_cells: [usize; 2],
) -> Option<SolvingStep> {
    for (i, &rc) in row_cells.iter().enumerate() {
        for (j, &cc) in col_cells.iter().enumerate() {
            if rc == cc || box_of(rc) != box_of(cc) {
                continue;
            }
            let far_row = row_cells[1 - i];
            let far_col = col_cells[1 - j];
            let eliminations = common_peer_eliminations(grid, far_row, far_col, digit);
            let cause = digit_cause(&[rc, cc, far_row, far_col], digit);
            if let Some(step) = SolvingStep::eliminating(Technique::TwoStringKite, eliminations, cause)
            {
                return Some(step);
            }
        }
    }
    None
}
