//! Wings: XY-Wing, XYZ-Wing and W-Wing.

use crate::board::{CELLS, PEERS, UNITS};

use super::{
    CandidateGrid, CauseCell, Elimination, SolvingStep, Technique, bit, common_peer_eliminations,
    digits, sees,
};

fn cells_with_count(grid: &CandidateGrid, count: u32) -> Vec<usize> {
    (0..CELLS)
        .filter(|&i| grid.is_empty(i) && grid.candidates(i).count_ones() == count)
        .collect()
}

fn cause_cell(grid: &CandidateGrid, index: usize) -> CauseCell {
    CauseCell {
        index,
        candidates: digits(grid.candidates(index)).collect(),
    }
}

/// Pivot `{a, b}` seeing pincers `{a, c}` and `{b, c}`: one pincer is `c`,
/// so cells seeing both pincers lose `c`.
pub(super) fn xy_wing(grid: &CandidateGrid) -> Option<SolvingStep> {
    let bivalue = cells_with_count(grid, 2);
    if bivalue.len() < 3 {
        return None;
    }

    for &pivot in &bivalue {
        let pivot_mask = grid.candidates(pivot);
        let wings: Vec<usize> = PEERS[pivot]
            .iter()
            .copied()
            .filter(|&i| {
                grid.is_empty(i)
                    && grid.candidates(i).count_ones() == 2
                    && grid.candidates(i) & pivot_mask != 0
            })
            .collect();

        for &first in &wings {
            // `first` must share exactly one pivot digit.
            let shared = grid.candidates(first) & pivot_mask;
            if shared.count_ones() != 1 {
                continue;
            }
            let c_mask = grid.candidates(first) & !shared;
            let want = (pivot_mask & !shared) | c_mask;
            let Some(c) = digits(c_mask).next() else {
                continue;
            };

            for &second in &wings {
                if second == first || grid.candidates(second) != want {
                    continue;
                }
                let eliminations = common_peer_eliminations(grid, first, second, c)
                    .into_iter()
                    .filter(|e| e.index != pivot)
                    .collect();
                let cause = vec![
                    cause_cell(grid, pivot),
                    cause_cell(grid, first),
                    cause_cell(grid, second),
                ];
                if let Some(step) = SolvingStep::eliminating(Technique::XyWing, eliminations, cause)
                {
                    return Some(step);
                }
            }
        }
    }
    None
}

/// Pivot `{x, y, z}` seeing pincers `{x, z}` and `{y, z}`: cells seeing all
/// three lose `z`.
pub(super) fn xyz_wing(grid: &CandidateGrid) -> Option<SolvingStep> {
    for pivot in cells_with_count(grid, 3) {
        let pivot_mask = grid.candidates(pivot);
        let pincers: Vec<usize> = PEERS[pivot]
            .iter()
            .copied()
            .filter(|&i| {
                grid.is_empty(i)
                    && grid.candidates(i).count_ones() == 2
                    && grid.candidates(i) & !pivot_mask == 0
            })
            .collect();

        for (k, &first) in pincers.iter().enumerate() {
            for &second in &pincers[k + 1..] {
                let common = pivot_mask & grid.candidates(first) & grid.candidates(second);
                let Some(z) = digits(common).next().filter(|_| common.count_ones() == 1) else {
                    continue;
                };
                let eliminations = PEERS[pivot]
                    .iter()
                    .copied()
                    .filter(|&i| grid.has(i, z) && sees(i, first) && sees(i, second))
                    .map(|index| Elimination { index, value: z })
                    .collect();
                let cause = vec![
                    cause_cell(grid, pivot),
                    cause_cell(grid, first),
                    cause_cell(grid, second),
                ];
                if let Some(step) = SolvingStep::eliminating(Technique::XyzWing, eliminations, cause)
                {
                    return Some(step);
                }
            }
        }
    }
    None
}

/// Two identical bivalue cells `{a, b}` that do not see each other, joined
/// by a strong link on `a`: cells seeing both lose `b`.
pub(super) fn w_wing(grid: &CandidateGrid) -> Option<SolvingStep> {
    let bivalue = cells_with_count(grid, 2);
    for (k, &one) in bivalue.iter().enumerate() {
        for &two in &bivalue[k + 1..] {
            let mask = grid.candidates(one);
            if grid.candidates(two) != mask || sees(one, two) {
                continue;
            }
            let mut pair = digits(mask);
            let (Some(a), Some(b)) = (pair.next(), pair.next()) else {
                continue;
            };
            let step = w_wing_link(grid, one, two, a, b).or_else(|| w_wing_link(grid, one, two, b, a));
            if step.is_some() {
                return step;
            }
        }
    }
    None
}

fn w_wing_link(
    grid: &CandidateGrid,
    one: usize,
    two: usize,
    link: u8,
    remove: u8,
) -> Option<SolvingStep> {
    for unit in &UNITS {
        let mut spots = unit.iter().copied().filter(|&i| grid.has(i, link));
        let (Some(p), Some(q), None) = (spots.next(), spots.next(), spots.next()) else {
            continue;
        };
        let linked = (sees(one, p) && sees(two, q)) || (sees(one, q) && sees(two, p));
        if !linked {
            continue;
        }

        let eliminations = common_peer_eliminations(grid, one, two, remove);
        let pair = vec![link, remove];
        let cause = vec![
            CauseCell {
                index: one,
                candidates: pair.clone(),
            },
            CauseCell {
                index: two,
                candidates: pair,
            },
            CauseCell {
                index: p,
                candidates: vec![link],
            },
            CauseCell {
                index: q,
                candidates: vec![link],
            },
        ];
        if let Some(step) = SolvingStep::eliminating(Technique::WWing, eliminations, cause) {
            return Some(step);
        }
    }
    None
}
