//! Unique rectangle, type 1.
//!
//! Four empty cells on two rows, two columns and exactly two boxes. If three
//! hold the same two candidates, the fourth cannot take either of them, or
//! the puzzle would have two solutions.

use crate::board::box_of;

use super::{CandidateGrid, CauseCell, Elimination, SolvingStep, Technique, digits};

pub(super) fn unique_rectangle_type1(grid: &CandidateGrid) -> Option<SolvingStep> {
    for r1 in 0..9 {
        for r2 in r1 + 1..9 {
            for c1 in 0..9 {
                for c2 in c1 + 1..9 {
                    let corners = [r1 * 9 + c1, r1 * 9 + c2, r2 * 9 + c1, r2 * 9 + c2];
                    if !spans_two_boxes(&corners) || corners.iter().any(|&i| !grid.is_empty(i)) {
                        continue;
                    }
                    if let Some(step) = rectangle(grid, &corners) {
                        return Some(step);
                    }
                }
            }
        }
    }
    None
}

/// Corners ordered top-left, top-right, bottom-left, bottom-right.
fn spans_two_boxes(corners: &[usize; 4]) -> bool {
    let [tl, tr, bl, br] = corners.map(box_of);
    (tl == bl && tr == br && tl != tr) || (tl == tr && bl == br && tl != bl)
}

fn rectangle(grid: &CandidateGrid, corners: &[usize; 4]) -> Option<SolvingStep> {
    let masks = corners.map(|i| grid.candidates(i));
    let pair = masks
        .iter()
        .copied()
        .find(|&m| m.count_ones() == 2 && masks.iter().filter(|&&other| other == m).count() >= 3)?;

    let target = masks.iter().position(|&m| m != pair && m & pair == pair)?;
    let values: Vec<u8> = digits(pair).collect();
    let eliminations = values
        .iter()
        .map(|&value| Elimination {
            index: corners[target],
            value,
        })
        .collect();
    let cause = corners
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != target)
        .map(|(_, &index)| CauseCell {
            index,
            candidates: values.clone(),
        })
        .collect();
    SolvingStep::eliminating(Technique::UniqueRectangleType1, eliminations, cause)
}
