//! Naked and hidden singles.

use crate::board::{CELLS, PEERS, UNITS};

use super::{CandidateGrid, Elimination, Placement, SolvingStep, Technique, bit, digits};

/// An empty cell with exactly one candidate left.
pub(super) fn naked_single(grid: &CandidateGrid) -> Option<SolvingStep> {
    let index = (0..CELLS).find(|&i| grid.is_empty(i) && grid.candidates(i).count_ones() == 1)?;
    let value = digits(grid.candidates(index)).next()?;
    Some(SolvingStep {
        technique: Technique::NakedSingle,
        placements: vec![Placement { index, value }],
        eliminations: peer_eliminations(grid, index, value),
        cause: Vec::new(),
    })
}

/// A digit that fits in only one cell of a unit.
pub(super) fn hidden_single(grid: &CandidateGrid) -> Option<SolvingStep> {
    for unit in &UNITS {
        for value in 1..=9 {
            let mut spots = unit.iter().copied().filter(|&i| grid.has(i, value));
            let (Some(index), None) = (spots.next(), spots.next()) else {
                continue;
            };

            let mut eliminations = peer_eliminations(grid, index, value);
            eliminations.extend(
                digits(grid.candidates(index) & !bit(value))
                    .map(|other| Elimination { index, value: other }),
            );
            return Some(SolvingStep {
                technique: Technique::HiddenSingle,
                placements: vec![Placement { index, value }],
                eliminations,
                cause: Vec::new(),
            });
        }
    }
    None
}

fn peer_eliminations(grid: &CandidateGrid, index: usize, value: u8) -> Vec<Elimination> {
    PEERS[index]
        .iter()
        .copied()
        .filter(|&peer| grid.has(peer, value))
        .map(|peer| Elimination { index: peer, value })
        .collect()
}
