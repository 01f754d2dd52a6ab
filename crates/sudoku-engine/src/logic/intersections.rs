//! Box/line interactions: pointing pairs and triples, claiming candidates.

use crate::board::{UNITS, box_of};

use super::{CandidateGrid, Elimination, SolvingStep, Technique, digit_cause};

/// A digit confined to one row or column inside a box leaves the rest of
/// that line.
pub(super) fn pointing(grid: &CandidateGrid) -> Option<SolvingStep> {
    for (b, unit) in UNITS[18..].iter().enumerate() {
        for digit in 1..=9 {
            let cells: Vec<usize> = unit.iter().copied().filter(|&i| grid.has(i, digit)).collect();
            let technique = match cells.len() {
                2 => Technique::PointingPair,
                3 => Technique::PointingTriple,
                _ => continue,
            };

            let (row, col) = (cells[0] / 9, cells[0] % 9);
            let lines = [
                (cells.iter().all(|&i| i / 9 == row), &UNITS[row]),
                (cells.iter().all(|&i| i % 9 == col), &UNITS[9 + col]),
            ];
            for (aligned, line) in lines {
                if !aligned {
                    continue;
                }
                let eliminations = line
                    .iter()
                    .copied()
                    .filter(|&i| box_of(i) != b && grid.has(i, digit))
                    .map(|index| Elimination {
                        index,
                        value: digit,
                    })
                    .collect();
                if let Some(step) =
                    SolvingStep::eliminating(technique, eliminations, digit_cause(&cells, digit))
                {
                    return Some(step);
                }
            }
        }
    }
    None
}

/// A digit confined to one box inside a row or column leaves the rest of
/// that box. Rows are checked before columns.
pub(super) fn claiming(grid: &CandidateGrid) -> Option<SolvingStep> {
    for line in &UNITS[..18] {
        for digit in 1..=9 {
            let cells: Vec<usize> = line.iter().copied().filter(|&i| grid.has(i, digit)).collect();
            let Some(&first) = cells.first() else {
                continue;
            };
            let b = box_of(first);
            if cells.iter().any(|&i| box_of(i) != b) {
                continue;
            }

            let eliminations = UNITS[18 + b]
                .iter()
                .copied()
                .filter(|&i| !line.contains(&i) && grid.has(i, digit))
                .map(|index| Elimination {
                    index,
                    value: digit,
                })
                .collect();
            if let Some(step) = SolvingStep::eliminating(
                Technique::ClaimingCandidate,
                eliminations,
                digit_cause(&cells, digit),
            ) {
                return Some(step);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, CELLS};
    use crate::logic::{ALL_CANDIDATES, bit, solve_with_steps};

    fn steps_with(puzzle: &str, technique: Technique) -> Vec<SolvingStep> {
        let board: Board = puzzle.parse().unwrap();
        solve_with_steps(&board)
            .0
            .into_iter()
            .filter(|step| step.technique == technique)
            .collect()
    }

    #[test]
    fn finds_claiming_candidate() {
        let found = steps_with(
            "7356814..681492.3.4..7356813.71..9.894..73.1.1....937.5.4318...8.392.15.21.5.78.3",
            Technique::ClaimingCandidate,
        );
        assert!(!found.is_empty());
        for step in found {
            // Eliminations stay inside the box of the claiming cells.
            let b = box_of(step.cause[0].index);
            assert!(step.eliminations.iter().all(|e| box_of(e.index) == b));
        }
    }

    #[test]
    fn finds_pointing_triple() {
        let found = steps_with(
            "6...5481.9.48136..81.62...42.648....18.36274.4..5.1268.68..5...5.2.38..6..1..658.",
            Technique::PointingTriple,
        );
        assert!(!found.is_empty());
        assert!(found.iter().all(|step| step.cause.len() == 3));
    }

    #[test]
    fn pointing_pair_in_a_row() {
        // Digit 5 in box 0 only fits at cells 0 and 1.
        let mut candidates = [ALL_CANDIDATES; CELLS];
        for i in [2, 9, 10, 11, 18, 19, 20] {
            candidates[i] &= !bit(5);
        }
        let grid = CandidateGrid {
            cells: [0; CELLS],
            candidates,
        };

        let step = pointing(&grid).unwrap();
        assert_eq!(step.technique, Technique::PointingPair);
        let removed: Vec<usize> = step.eliminations.iter().map(|e| e.index).collect();
        assert_eq!(removed, vec![3, 4, 5, 6, 7, 8]);
        assert!(step.eliminations.iter().all(|e| e.value == 5));
    }
}
