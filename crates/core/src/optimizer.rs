//! Multi-restart optimization of a single group.
//!
//! Each restart picks a seed layout (the incumbent, an elite survivor, a
//! perturbed elite, or a fresh random layout for small groups), optionally
//! compresses it, and runs the anneal → local search → fractional polish
//! pipeline. A small elite population carries the best layouts across
//! restarts so later perturbations start from proven structure.

use crate::layout::Layout;
use crate::refine::{fractional_translation, local_search};
use crate::sa::{anneal, SaConfig};
use crate::seeding::{compress_layout, perturb, random_layout};

/// Elite layouts retained across restarts.
const ELITE_LEN: usize = 3;

/// Local-search passes after each anneal.
const LS_PASSES: usize = 300;

/// Fractional-translation passes after each local search.
const FT_PASSES: usize = 150;

/// Per-group optimization parameters.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Independent restarts per group.
    pub restarts: usize,
    /// Annealing steps per restart.
    pub sa_iterations: usize,
    /// Base seed; every restart seed derives from `(seed_base, restart, n)`.
    pub seed_base: u64,
    /// Restarts seeded from scratch instead of the incumbent (0 = never).
    pub random_inits: usize,
    /// Largest group size eligible for random seeding.
    pub random_init_max_n: usize,
    /// Extent multiplier for the random placement square.
    pub random_init_scale: f64,
    /// Tries per random seed before falling back to the incumbent.
    pub random_init_tries: usize,
    /// Placement attempts per tree within one try.
    pub random_init_max_attempts: usize,
    /// Compression steps applied to each restart seed (0 = off).
    pub compress_steps: usize,
    /// Shrink factor per compression step.
    pub compress_factor: f64,
    /// Separation passes allowed per compression step.
    pub compress_relax_iters: usize,
    /// Separation step size during compression.
    pub compress_relax_step: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            restarts: 80,
            sa_iterations: 20_000,
            seed_base: 0,
            random_inits: 0,
            random_init_max_n: 12,
            random_init_scale: 1.2,
            random_init_tries: 4,
            random_init_max_attempts: 2000,
            compress_steps: 0,
            compress_factor: 0.99,
            compress_relax_iters: 60,
            compress_relax_step: 0.02,
        }
    }
}

impl OptimizerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the restart count.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Sets the annealing steps per restart.
    pub fn with_sa_iterations(mut self, iterations: usize) -> Self {
        self.sa_iterations = iterations;
        self
    }

    /// Sets the base seed.
    pub fn with_seed_base(mut self, seed_base: u64) -> Self {
        self.seed_base = seed_base;
        self
    }
}

/// Runs the multi-restart pipeline and returns the best layout found.
pub fn optimize_group(start: &Layout, config: &OptimizerConfig) -> Layout {
    let n = start.len() as u64;
    let mut best = start.clone();
    let mut best_side = best.side();
    let mut elites: Vec<(f64, Layout)> = vec![(best_side, start.clone())];

    for r in 0..config.restarts {
        let ru = r as u64;
        let restart_seed = config
            .seed_base
            .wrapping_add(42)
            .wrapping_add(ru.wrapping_mul(1000))
            .wrapping_add(n);

        let use_random = config.random_inits > 0
            && start.len() <= config.random_init_max_n
            && r < config.random_inits;

        let mut seed_layout = if use_random {
            let base_side = start.side().max(0.1);
            let init_seed = config
                .seed_base
                .wrapping_add(777)
                .wrapping_add(ru.wrapping_mul(1337))
                .wrapping_add(n);
            random_layout(
                start.len(),
                base_side,
                config.random_init_scale,
                config.random_init_tries,
                config.random_init_max_attempts,
                init_seed,
            )
            .unwrap_or_else(|| start.clone())
        } else if r == 0 {
            start.clone()
        } else if r < elites.len() {
            elites[r % elites.len()].1.clone()
        } else {
            perturb(
                &elites[0].1,
                0.1 + 0.05 * (r % 3) as f64,
                restart_seed,
            )
        };

        if config.compress_steps > 0 && config.compress_factor < 1.0 {
            let compress_seed = config
                .seed_base
                .wrapping_add(9999)
                .wrapping_add(ru.wrapping_mul(17))
                .wrapping_add(n);
            seed_layout = compress_layout(
                &seed_layout,
                config.compress_steps,
                config.compress_factor,
                config.compress_relax_iters,
                config.compress_relax_step,
                compress_seed,
            );
        }

        let sa_config = SaConfig::default().with_iterations(config.sa_iterations);
        let annealed = anneal(&seed_layout, &sa_config, restart_seed);
        let refined = fractional_translation(&local_search(&annealed, LS_PASSES), FT_PASSES);

        let side = refined.side();
        log::debug!(
            "n={} restart {}: side {:.9} (best {:.9})",
            start.len(),
            r,
            side,
            best_side
        );

        elites.push((side, refined.clone()));
        elites.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        elites.truncate(ELITE_LEN);

        if side < best_side {
            best_side = side;
            best = refined;
        }
    }

    best
}
