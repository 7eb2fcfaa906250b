//! Deterministic greedy refinement.
//!
//! Two passes share the same skeleton: probe each tree with a fixed
//! ladder of step sizes in 8 directions (plus ± rotations in the coarse
//! pass), keep a probe only when it is feasible and strictly shrinks the
//! bounding side, and stop after a full pass without improvement.
//!
//! [`local_search`] handles trees on the global bounding box first: only
//! those can reduce `side` at all, and clearing them early opens room for
//! the interior trees that follow.

use crate::layout::Layout;

/// Translation step ladder for the coarse pass, largest first.
const POS_STEPS: [f64; 7] = [0.02, 0.01, 0.005, 0.002, 0.001, 0.0005, 0.0002];

/// Rotation step ladder in degrees.
const ROT_STEPS: [f64; 7] = [15.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.25];

/// Sub-micro translation ladder for the polish pass.
const FRAC_STEPS: [f64; 7] = [1e-3, 5e-4, 2e-4, 1e-4, 5e-5, 2e-5, 1e-5];

/// The 8 axis and diagonal probe directions.
const DIRECTIONS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (1.0, 1.0),
    (1.0, -1.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
];

/// Improvement threshold for the coarse pass.
const LS_TOL: f64 = 1e-10;

/// Improvement threshold for the polish pass.
const FT_TOL: f64 = 1e-12;

/// Probes a translation of tree `i`; keeps it only on a feasible strict
/// improvement of the bounding side.
fn try_translate(
    layout: &mut Layout,
    i: usize,
    dx: f64,
    dy: f64,
    best_side: &mut f64,
    tol: f64,
) -> bool {
    let old = layout.pose(i);
    layout.set_pose(i, old.translated(dx, dy));
    if !layout.has_overlap(i) {
        let side = layout.side();
        if side < *best_side - tol {
            *best_side = side;
            return true;
        }
    }
    layout.set_pose(i, old);
    false
}

/// Rotation counterpart of [`try_translate`].
fn try_rotate(layout: &mut Layout, i: usize, ddeg: f64, best_side: &mut f64, tol: f64) -> bool {
    let old = layout.pose(i);
    layout.set_pose(i, old.rotated(ddeg));
    if !layout.has_overlap(i) {
        let side = layout.side();
        if side < *best_side - tol {
            *best_side = side;
            return true;
        }
    }
    layout.set_pose(i, old);
    false
}

/// Runs the full probe ladder (translations then rotations) on one tree.
fn refine_tree(layout: &mut Layout, i: usize, best_side: &mut f64) -> bool {
    let mut improved = false;
    for &step in &POS_STEPS {
        for &(dx, dy) in &DIRECTIONS {
            improved |= try_translate(layout, i, dx * step, dy * step, best_side, LS_TOL);
        }
    }
    for &step in &ROT_STEPS {
        for ddeg in [step, -step] {
            improved |= try_rotate(layout, i, ddeg, best_side, LS_TOL);
        }
    }
    improved
}

/// Greedy multi-scale descent, corner trees first.
///
/// Monotone in `side`; every kept probe is feasible.
pub fn local_search(start: &Layout, max_passes: usize) -> Layout {
    let mut best = start.clone();
    let mut best_side = best.side();

    for _ in 0..max_passes {
        let mut improved = false;
        let corners = best.corner_trees();
        let mut is_corner = vec![false; best.len()];
        for &i in &corners {
            is_corner[i] = true;
        }
        for &i in &corners {
            improved |= refine_tree(&mut best, i, &mut best_side);
        }
        for i in 0..best.len() {
            if is_corner[i] {
                continue;
            }
            improved |= refine_tree(&mut best, i, &mut best_side);
        }
        if !improved {
            break;
        }
    }
    best
}

/// Translation-only polish at sub-micro step sizes, over every tree.
///
/// Runs after [`local_search`] to squeeze out the last fractions the
/// coarse ladder cannot reach. No rotation phase; tangent contacts left
/// by the coarse pass stay legal under the strict overlap predicate.
pub fn fractional_translation(start: &Layout, max_passes: usize) -> Layout {
    let mut best = start.clone();
    let mut best_side = best.side();

    for _ in 0..max_passes {
        let mut improved = false;
        for i in 0..best.len() {
            for &step in &FRAC_STEPS {
                for &(dx, dy) in &DIRECTIONS {
                    improved |= try_translate(&mut best, i, dx * step, dy * step, &mut best_side, FT_TOL);
                }
            }
        }
        if !improved {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Pose;

    fn row(n: usize, pitch: f64) -> Layout {
        Layout::from_poses(
            (0..n)
                .map(|i| Pose::new(i as f64 * pitch, 0.0, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_local_search_shrinks_loose_row() {
        let start = row(2, 1.5);
        let out = local_search(&start, 50);
        assert!(!out.any_overlap());
        assert!(out.side() < start.side() - 0.01);
    }

    #[test]
    fn test_local_search_monotone_on_tight_layout() {
        // Nearly touching pair: whatever the pass finds, the side must
        // never get worse and feasibility must survive.
        let start = row(2, 0.75);
        let out = local_search(&start, 20);
        assert!(!out.any_overlap());
        assert!(out.side() <= start.side() + 1e-12);
    }

    #[test]
    fn test_fractional_translation_monotone() {
        let start = row(3, 0.75);
        let out = fractional_translation(&start, 30);
        assert!(!out.any_overlap());
        assert!(out.side() <= start.side() + 1e-12);
    }

    #[test]
    fn test_fractional_translation_closes_small_gaps() {
        let start = row(2, 0.705);
        let out = fractional_translation(&start, 50);
        assert!(!out.any_overlap());
        assert!(out.side() < start.side());
    }

    #[test]
    fn test_single_tree_rotation_can_improve() {
        // A lone tree is 1.0 tall but only 0.7 wide; tilting it trades
        // height for width and shrinks the longer side.
        let start = row(1, 0.0);
        let out = local_search(&start, 50);
        assert!(out.side() < start.side());
    }
}
