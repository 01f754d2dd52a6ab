//! Naked and hidden pairs and triples within a unit.

use crate::board::UNITS;

use super::{
    CandidateGrid, CauseCell, Elimination, SolvingStep, Technique, bit, digits, find_combination,
};

pub(super) fn naked_pair(grid: &CandidateGrid) -> Option<SolvingStep> {
    naked_subset(grid, 2, Technique::NakedPair)
}

pub(super) fn naked_triple(grid: &CandidateGrid) -> Option<SolvingStep> {
    naked_subset(grid, 3, Technique::NakedTriple)
}

pub(super) fn hidden_pair(grid: &CandidateGrid) -> Option<SolvingStep> {
    hidden_subset(grid, 2, Technique::HiddenPair)
}

pub(super) fn hidden_triple(grid: &CandidateGrid) -> Option<SolvingStep> {
    hidden_subset(grid, 3, Technique::HiddenTriple)
}

/// `size` cells of a unit whose candidates together hold exactly `size`
/// digits. Those digits leave the rest of the unit.
fn naked_subset(grid: &CandidateGrid, size: usize, technique: Technique) -> Option<SolvingStep> {
    for unit in &UNITS {
        let cells: Vec<usize> = unit
            .iter()
            .copied()
            .filter(|&i| {
                let count = grid.candidates(i).count_ones() as usize;
                grid.is_empty(i) && (2..=size).contains(&count)
            })
            .collect();
        if cells.len() < size {
            continue;
        }

        let step = find_combination(&cells, size, |subset| {
            let mask = subset.iter().fold(0, |m, &i| m | grid.candidates(i));
            if mask.count_ones() as usize != size {
                return None;
            }
            let eliminations = unit
                .iter()
                .copied()
                .filter(|&i| grid.is_empty(i) && !subset.contains(&i))
                .flat_map(|index| {
                    digits(grid.candidates(index) & mask).map(move |value| Elimination { index, value })
                })
                .collect();
            let cause = subset
                .iter()
                .map(|&index| CauseCell {
                    index,
                    candidates: digits(mask).collect(),
                })
                .collect();
            SolvingStep::eliminating(technique, eliminations, cause)
        });
        if step.is_some() {
            return step;
        }
    }
    None
}

/// `size` digits confined to the same `size` cells of a unit. Every other
/// candidate leaves those cells.
fn hidden_subset(grid: &CandidateGrid, size: usize, technique: Technique) -> Option<SolvingStep> {
    for unit in &UNITS {
        // positions[d] has bit p set when d is a candidate at unit[p].
        let mut positions = [0u16; 10];
        for (p, &index) in unit.iter().enumerate() {
            if grid.is_empty(index) {
                for d in digits(grid.candidates(index)) {
                    positions[d as usize] |= 1 << p;
                }
            }
        }
        let candidates: Vec<u8> = (1..=9u8)
            .filter(|&d| (2..=size).contains(&(positions[d as usize].count_ones() as usize)))
            .collect();
        if candidates.len() < size {
            continue;
        }

        let step = find_combination(&candidates, size, |subset| {
            let spots = subset.iter().fold(0u16, |m, &d| m | positions[d as usize]);
            if spots.count_ones() as usize != size {
                return None;
            }
            let keep = subset.iter().fold(0u16, |m, &d| m | bit(d));
            let cells: Vec<usize> = unit
                .iter()
                .enumerate()
                .filter(|&(p, _)| spots & (1 << p) != 0)
                .map(|(_, &index)| index)
                .collect();
            let eliminations = cells
                .iter()
                .flat_map(|&index| {
                    digits(grid.candidates(index) & !keep).map(move |value| Elimination { index, value })
                })
                .collect();
            let cause = cells
                .iter()
                .map(|&index| CauseCell {
                    index,
                    candidates: subset.to_vec(),
                })
                .collect();
            SolvingStep::eliminating(technique, eliminations, cause)
        });
        if step.is_some() {
            return step;
        }
    }
    None
}
