//! Basic fish: X-Wing, Swordfish and Jellyfish.
//!
//! For one digit, `n` base lines whose candidates all fall within `n` cover
//! lines of the other orientation. The digit must sit on the base lines
//! within those covers, so it leaves the rest of every cover line.

use super::{CandidateGrid, CauseCell, Elimination, SolvingStep, Technique, find_combination};

const SIZES: [(usize, Technique); 3] = [
    (2, Technique::XWing),
    (3, Technique::Swordfish),
    (4, Technique::Jellyfish),
];

pub(super) fn fish(grid: &CandidateGrid) -> Option<SolvingStep> {
    let (rows, cols) = grid.line_masks();
    for digit in 1..=9u8 {
        for (size, technique) in SIZES {
            let by_row = find_fish(grid, digit, &rows[digit as usize], size, true, technique);
            if by_row.is_some() {
                return by_row;
            }
            let by_col = find_fish(grid, digit, &cols[digit as usize], size, false, technique);
            if by_col.is_some() {
                return by_col;
            }
        }
    }
    None
}

/// Cell at position `cross` along `line`, reading lines as rows or columns.
fn cell_at(rows: bool, line: usize, cross: usize) -> usize {
    if rows { line * 9 + cross } else { cross * 9 + line }
}

fn find_fish(
    grid: &CandidateGrid,
    digit: u8,
    masks: &[u16; 9],
    size: usize,
    rows: bool,
    technique: Technique,
) -> Option<SolvingStep> {
    let lines: Vec<usize> = (0..9)
        .filter(|&l| (2..=size).contains(&(masks[l].count_ones() as usize)))
        .collect();
    if lines.len() < size {
        return None;
    }

    find_combination(&lines, size, |base| {
        let cover_mask = base.iter().fold(0u16, |m, &l| m | masks[l]);
        if cover_mask.count_ones() as usize > size {
            return None;
        }
        let covers: Vec<usize> = (0..9).filter(|&c| cover_mask & (1 << c) != 0).collect();

        let cause = base
            .iter()
            .flat_map(|&line| covers.iter().map(move |&cross| cell_at(rows, line, cross)))
            .filter(|&i| grid.has(i, digit))
            .map(|index| CauseCell {
                index,
                candidates: vec![digit],
            })
            .collect();
        let eliminations = covers
            .iter()
            .flat_map(|&cross| {
                (0..9)
                    .filter(|line| !base.contains(line))
                    .map(move |line| cell_at(rows, line, cross))
            })
            .filter(|&i| grid.has(i, digit))
            .map(|index| Elimination {
                index,
                value: digit,
            })
            .collect();
        SolvingStep::eliminating(technique, eliminations, cause)
    })
}
