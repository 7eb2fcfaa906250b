//! Seeding and diversification between restarts.
//!
//! These operators produce *starting points* for the annealer, and unlike
//! the refinement passes they do not all promise feasibility on return:
//! [`perturb`] repairs best-effort and may give up, and
//! [`compress_layout`] backs off to its last feasible snapshot. Callers
//! treat the results as seeds, not solutions; the annealer tolerates an
//! overlapping seed by rejecting every move that keeps the moved trees in
//! conflict.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use crate::geometry::overlap;
use crate::layout::{Layout, Pose};

/// Fraction of the group shaken by one perturbation.
const PERTURB_FRACTION: f64 = 0.15;

/// Outward nudge applied to an overlapping tree during repair.
const REPAIR_STEP: f64 = 0.02;

/// Repair passes before giving up.
const REPAIR_PASSES: usize = 100;

/// Shakes a sample of trees and repairs the damage best-effort.
///
/// `max(1, ⌊0.15·n⌋)` draws (with replacement) each receive a position
/// offset of up to `±strength/2` per axis and a turn of up to `±30°`.
/// Repair then pushes overlapping trees away from the centroid in small
/// steps with a little extra spin; if 100 passes are not enough the
/// layout is returned still overlapping.
pub fn perturb(start: &Layout, strength: f64, seed: u64) -> Layout {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = start.clone();
    let n = out.len();

    let shaken = ((n as f64 * PERTURB_FRACTION) as usize).max(1);
    for _ in 0..shaken {
        let i = rng.gen_range(0..n);
        let pose = out.pose(i);
        out.set_pose(
            i,
            pose.translated(
                (rng.gen::<f64>() - 0.5) * strength,
                (rng.gen::<f64>() - 0.5) * strength,
            )
            .rotated((rng.gen::<f64>() - 0.5) * 60.0),
        );
    }

    for _ in 0..REPAIR_PASSES {
        let mut clean = true;
        for i in 0..n {
            if !out.has_overlap(i) {
                continue;
            }
            clean = false;
            let (cx, cy) = out.centroid();
            let pose = out.pose(i);
            let (dx, dy) = (cx - pose.x, cy - pose.y);
            let dist = dx.hypot(dy);
            let mut moved = pose;
            if dist > 1e-6 {
                moved = moved.translated(-dx / dist * REPAIR_STEP, -dy / dist * REPAIR_STEP);
            }
            out.set_pose(i, moved.rotated(rng.gen::<f64>() * 20.0 - 10.0));
        }
        if clean {
            break;
        }
    }
    out
}

/// Scales all pose centers about the origin.
pub fn scale_layout(layout: &mut Layout, factor: f64) {
    for i in 0..layout.len() {
        let pose = layout.pose(i);
        layout.set_pose(i, Pose::new(pose.x * factor, pose.y * factor, pose.deg));
    }
}

/// Pushes every overlapping pair symmetrically apart by `step` along the
/// line between their centers (random direction when the centers nearly
/// coincide). Returns true iff the layout is overlap-free on exit.
pub fn resolve_overlaps(layout: &mut Layout, max_iter: usize, step: f64, seed: u64) -> bool {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..max_iter {
        let mut any = false;
        for i in 0..layout.len() {
            for j in (i + 1)..layout.len() {
                if !overlap(layout.poly(i), layout.poly(j)) {
                    continue;
                }
                any = true;
                let (pi, pj) = (layout.pose(i), layout.pose(j));
                let (dx, dy) = (pi.x - pj.x, pi.y - pj.y);
                let dist = dx.hypot(dy);
                let (ux, uy) = if dist < 1e-6 {
                    let angle = rng.gen::<f64>() * TAU;
                    (angle.cos(), angle.sin())
                } else {
                    (dx / dist, dy / dist)
                };
                layout.set_pose(i, pi.translated(ux * step, uy * step));
                layout.set_pose(j, pj.translated(-ux * step, -uy * step));
            }
        }
        if !any {
            return true;
        }
    }
    !layout.any_overlap()
}

/// Shrinks a layout toward the origin in small multiplicative steps,
/// re-separating after each one. Stops at the first step whose overlaps
/// cannot be resolved and returns the last feasible snapshot. Identity
/// when `steps == 0` or `factor >= 1`.
pub fn compress_layout(
    start: &Layout,
    steps: usize,
    factor: f64,
    relax_iters: usize,
    relax_step: f64,
    seed: u64,
) -> Layout {
    if steps == 0 || factor >= 1.0 {
        return start.clone();
    }
    let mut best = start.clone();
    for s in 0..steps {
        let mut candidate = best.clone();
        scale_layout(&mut candidate, factor);
        if !resolve_overlaps(
            &mut candidate,
            relax_iters,
            relax_step,
            seed.wrapping_add(s as u64 * 1337),
        ) {
            break;
        }
        best = candidate;
    }
    best
}

/// Attempts a feasible random layout by sequential rejection sampling.
///
/// Each try places trees one by one, uniform in a square of half-extent
/// `base_side·scale/2` with uniform rotation, re-rolling a tree up to
/// `max_attempts` times before abandoning the try. Every failed try grows
/// the square by 8%. Returns `None` when all tries fail.
pub fn random_layout(
    n: usize,
    base_side: f64,
    scale: f64,
    tries: usize,
    max_attempts: usize,
    seed: u64,
) -> Option<Layout> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scale = scale.max(1.01);

    for _ in 0..tries.max(1) {
        let half = base_side * scale * 0.5;
        let mut layout = Layout::with_len(n);
        let mut complete = true;

        'place: for i in 0..n {
            for _ in 0..max_attempts {
                layout.set_pose(
                    i,
                    Pose::new(
                        (rng.gen::<f64>() * 2.0 - 1.0) * half,
                        (rng.gen::<f64>() * 2.0 - 1.0) * half,
                        rng.gen::<f64>() * 360.0,
                    ),
                );
                if (0..i).all(|j| !overlap(layout.poly(i), layout.poly(j))) {
                    continue 'place;
                }
            }
            complete = false;
            break;
        }

        if complete {
            return Some(layout);
        }
        scale *= 1.08;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(n: usize, pitch: f64) -> Layout {
        Layout::from_poses(
            (0..n)
                .map(|i| Pose::new(i as f64 * pitch, 0.0, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_perturb_moves_poses_deterministically() {
        let start = row(10, 1.5);
        let a = perturb(&start, 0.2, 42);
        let b = perturb(&start, 0.2, 42);
        assert_eq!(a.poses(), b.poses());
        assert_ne!(a.poses(), start.poses());
    }

    #[test]
    fn test_scale_layout_rebuilds_polygons() {
        let mut layout = row(2, 1.0);
        scale_layout(&mut layout, 2.0);
        assert_relative_eq!(layout.pose(1).x, 2.0);
        assert_relative_eq!(layout.poly(1).bbox().min_x, 2.0 - 0.35);
    }

    #[test]
    fn test_resolve_overlaps_single_pass_separation() {
        // One pass moves each tree of an overlapping pair by `step`, so
        // the center distance grows by exactly 2·step.
        let mut layout = row(2, 0.1);
        let separated = resolve_overlaps(&mut layout, 1, 0.05, 0);
        assert!(!separated);
        assert_relative_eq!(layout.pose(0).x, -0.05);
        assert_relative_eq!(layout.pose(1).x, 0.15);
    }

    #[test]
    fn test_resolve_overlaps_reaches_feasibility() {
        let mut layout = row(2, 0.1);
        assert!(resolve_overlaps(&mut layout, 200, 0.05, 0));
        assert!(!layout.any_overlap());
    }

    #[test]
    fn test_compress_is_identity_when_disabled() {
        let start = row(3, 1.5);
        assert_eq!(
            compress_layout(&start, 0, 0.9, 50, 0.02, 0).poses(),
            start.poses()
        );
        assert_eq!(
            compress_layout(&start, 5, 1.0, 50, 0.02, 0).poses(),
            start.poses()
        );
    }

    #[test]
    fn test_compress_shrinks_loose_layout() {
        let start = row(2, 2.0);
        let out = compress_layout(&start, 3, 0.95, 60, 0.02, 9);
        assert!(!out.any_overlap());
        assert!(out.side() <= start.side());
    }

    #[test]
    fn test_random_layout_feasible() {
        let layout = random_layout(4, 3.0, 1.5, 5, 500, 7).expect("should place 4 trees");
        assert_eq!(layout.len(), 4);
        assert!(!layout.any_overlap());
    }

    #[test]
    fn test_random_layout_gives_up_when_too_tight() {
        // Two trees cannot fit with both centers confined to a box a
        // tenth of a tree wide.
        assert!(random_layout(2, 0.1, 1.01, 1, 50, 1).is_none());
    }
}
