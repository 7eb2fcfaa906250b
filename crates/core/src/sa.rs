//! Simulated annealing over one group layout.
//!
//! The engine draws one of eight move operators per step, scaled by the
//! current temperature, and gates every tentative move on the overlap
//! predicate before the acceptance test. Two details set it apart from a
//! textbook annealer:
//!
//! - **Reject-to-best**: a rejected acceptance test does not keep the
//!   current layout, it teleports back to the best layout seen so far.
//!   Temperature therefore acts as an exploration budget around the
//!   incumbent rather than a free random walk.
//! - **Reheating**: after 600 steps without a new best the temperature is
//!   tripled (capped at `0.7·T0`), reintroducing structural change that
//!   the aggressive exploitation would otherwise starve.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::layout::{Layout, Pose};

/// Stale steps tolerated before reheating.
const REHEAT_AFTER: u32 = 600;

/// Tuning knobs for one annealing run.
#[derive(Debug, Clone)]
pub struct SaConfig {
    /// Number of annealing steps.
    pub iterations: usize,
    /// Starting temperature.
    pub initial_temp: f64,
    /// Temperature floor.
    pub final_temp: f64,
    /// Base translation amplitude.
    pub move_scale: f64,
    /// Base rotation amplitude in degrees.
    pub rot_scale: f64,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            iterations: 20_000,
            initial_temp: 1.0,
            final_temp: 5e-6,
            move_scale: 0.25,
            rot_scale: 70.0,
        }
    }
}

impl SaConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of annealing steps.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the temperature schedule endpoints.
    pub fn with_temperature(mut self, initial: f64, floor: f64) -> Self {
        self.initial_temp = initial;
        self.final_temp = floor;
        self
    }

    /// Sets the base translation amplitude.
    pub fn with_move_scale(mut self, scale: f64) -> Self {
        self.move_scale = scale;
        self
    }

    /// Sets the base rotation amplitude in degrees.
    pub fn with_rot_scale(mut self, scale: f64) -> Self {
        self.rot_scale = scale;
        self
    }
}

/// Runs one annealing pass and returns the best layout seen.
///
/// A feasible input stays feasible: every accepted move passes the
/// overlap gate. An infeasible input (a perturbed seed whose repair gave
/// up) is tolerated; moves that leave the moved trees overlap-free are
/// still accepted, which in practice walks the layout back to
/// feasibility.
pub fn anneal(start: &Layout, config: &SaConfig, seed: u64) -> Layout {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut best = start.clone();
    let mut cur = start.clone();
    let mut best_side = best.side();
    let mut cur_side = best_side;

    let t0 = config.initial_temp;
    let floor = config.final_temp;
    let alpha = (floor / t0).powf(1.0 / config.iterations as f64);
    let mut t = t0;
    let mut no_improve = 0u32;

    for _ in 0..config.iterations {
        let move_type = rng.gen_range(0..8);
        let scale = t / t0;

        if !apply_move(&mut cur, move_type, scale, config, &mut rng) {
            no_improve += 1;
            t = (t * alpha).max(floor);
            continue;
        }

        let new_side = cur.side();
        let delta = new_side - cur_side;
        if delta < 0.0 || rng.gen::<f64>() < (-delta / t).exp() {
            cur_side = new_side;
            if new_side < best_side {
                best_side = new_side;
                best = cur.clone();
                no_improve = 0;
            } else {
                no_improve += 1;
            }
        } else {
            cur = best.clone();
            cur_side = best_side;
            no_improve += 1;
        }

        if no_improve > REHEAT_AFTER {
            t = (t * 3.0).min(t0 * 0.7);
            log::debug!("reheated to T={:.6e} after {} stale steps", t, REHEAT_AFTER);
            no_improve = 0;
        }
        t = (t * alpha).max(floor);
    }

    best
}

/// Applies one tentative move; returns false (layout restored) when the
/// moved trees end up overlapping.
fn apply_move<R: Rng>(
    cur: &mut Layout,
    move_type: u8,
    scale: f64,
    config: &SaConfig,
    rng: &mut R,
) -> bool {
    let n = cur.len();
    let ms = config.move_scale;
    let rs = config.rot_scale;

    match move_type {
        // Single-tree jiggles: random step, pull toward the centroid,
        // rotation, or a combined small step and turn.
        0..=3 => {
            let i = rng.gen_range(0..n);
            let old = cur.pose(i);
            let moved = match move_type {
                0 => old.translated(
                    (rng.gen::<f64>() - 0.5) * 2.0 * ms * scale,
                    (rng.gen::<f64>() - 0.5) * 2.0 * ms * scale,
                ),
                1 => {
                    let (cx, cy) = cur.centroid();
                    let (dx, dy) = (cx - old.x, cy - old.y);
                    let dist = dx.hypot(dy);
                    if dist > 1e-6 {
                        let step = rng.gen::<f64>() * ms * scale;
                        old.translated(dx / dist * step, dy / dist * step)
                    } else {
                        old
                    }
                }
                2 => old.rotated((rng.gen::<f64>() - 0.5) * 2.0 * rs * scale),
                _ => old
                    .translated(
                        (rng.gen::<f64>() - 0.5) * ms * scale,
                        (rng.gen::<f64>() - 0.5) * ms * scale,
                    )
                    .rotated((rng.gen::<f64>() - 0.5) * rs * scale),
            };
            cur.set_pose(i, moved);
            if cur.has_overlap(i) {
                cur.set_pose(i, old);
                return false;
            }
            true
        }
        // Swap the positions of two trees, keeping their angles.
        4 if n > 1 => {
            let i = rng.gen_range(0..n);
            let mut j = rng.gen_range(0..n);
            while j == i {
                j = rng.gen_range(0..n);
            }
            let (pi, pj) = (cur.pose(i), cur.pose(j));
            cur.set_pose(i, Pose::new(pj.x, pj.y, pi.deg));
            cur.set_pose(j, Pose::new(pi.x, pi.y, pj.deg));
            if cur.has_overlap_pair(i, j) {
                cur.set_pose(i, pi);
                cur.set_pose(j, pj);
                return false;
            }
            true
        }
        // Pull one tree toward the bounding-box center.
        5 => {
            let i = rng.gen_range(0..n);
            let old = cur.pose(i);
            let (bcx, bcy) = cur.bounding_box().center();
            let (dx, dy) = (bcx - old.x, bcy - old.y);
            let dist = dx.hypot(dy);
            let moved = if dist > 1e-6 {
                let step = rng.gen::<f64>() * ms * scale * 0.5;
                old.translated(dx / dist * step, dy / dist * step)
            } else {
                old
            };
            cur.set_pose(i, moved);
            if cur.has_overlap(i) {
                cur.set_pose(i, old);
                return false;
            }
            true
        }
        // Pull a random corner tree inward and give it a small turn.
        6 => {
            let corners = cur.corner_trees();
            if corners.is_empty() {
                return false;
            }
            let i = corners[rng.gen_range(0..corners.len())];
            let old = cur.pose(i);
            let (bcx, bcy) = cur.bounding_box().center();
            let (dx, dy) = (bcx - old.x, bcy - old.y);
            let dist = dx.hypot(dy);
            let moved = if dist > 1e-6 {
                let step = rng.gen::<f64>() * ms * scale * 0.3;
                old.translated(dx / dist * step, dy / dist * step)
                    .rotated((rng.gen::<f64>() - 0.5) * rs * scale * 0.5)
            } else {
                old
            };
            cur.set_pose(i, moved);
            if cur.has_overlap(i) {
                cur.set_pose(i, old);
                return false;
            }
            true
        }
        // Joint move: shift two neighboring trees by the same delta. With
        // n == 1 the pair collapses to one tree checked against itself,
        // which always fails the pair predicate, so the step counts as a
        // rejected no-op (this arm also absorbs move 4 when n == 1).
        _ => {
            let i = rng.gen_range(0..n);
            let j = (i + 1) % n;
            let (pi, pj) = (cur.pose(i), cur.pose(j));
            let dx = (rng.gen::<f64>() - 0.5) * ms * scale * 0.5;
            let dy = (rng.gen::<f64>() - 0.5) * ms * scale * 0.5;
            cur.set_pose(i, pi.translated(dx, dy));
            cur.set_pose(j, pj.translated(dx, dy));
            if cur.has_overlap_pair(i, j) {
                cur.set_pose(i, pi);
                cur.set_pose(j, pj);
                return false;
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: usize, pitch: f64) -> Layout {
        Layout::from_poses(
            (0..n)
                .map(|i| Pose::new(i as f64 * pitch, 0.0, 0.0))
                .collect(),
        )
    }

    fn quick_config() -> SaConfig {
        SaConfig::default().with_iterations(400)
    }

    #[test]
    fn test_anneal_keeps_feasibility_and_never_worsens() {
        let start = row(3, 1.2);
        let out = anneal(&start, &quick_config(), 7);
        assert_eq!(out.len(), 3);
        assert!(!out.any_overlap());
        assert!(out.side() <= start.side() + 1e-12);
    }

    #[test]
    fn test_anneal_is_deterministic_per_seed() {
        let start = row(4, 1.1);
        let a = anneal(&start, &quick_config(), 99);
        let b = anneal(&start, &quick_config(), 99);
        assert_eq!(a.poses(), b.poses());
    }

    #[test]
    fn test_anneal_single_tree() {
        let start = row(1, 0.0);
        let out = anneal(&start, &quick_config(), 3);
        assert_eq!(out.len(), 1);
        assert!(out.side() <= start.side() + 1e-12);
    }

    #[test]
    fn test_anneal_tolerates_infeasible_start() {
        // Overlapping seed, as a failed perturb repair would hand over.
        let start = row(3, 0.2);
        let out = anneal(&start, &quick_config(), 11);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_anneal_shrinks_loose_row() {
        let start = row(2, 2.5);
        let config = SaConfig::default().with_iterations(3000);
        let out = anneal(&start, &config, 5);
        assert!(!out.any_overlap());
        assert!(out.side() < start.side());
    }
}
