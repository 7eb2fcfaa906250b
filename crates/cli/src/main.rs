//! Generation-driver CLI: re-anneals every group of a submission.

use std::path::PathBuf;

use clap::Parser;
use treepack_core::{driver, io, DriverConfig, OptimizerConfig};

#[derive(Parser)]
#[command(name = "treepack")]
#[command(about = "Shrinks a tree-packing submission by per-group annealing")]
#[command(version)]
struct Cli {
    /// Input submission CSV
    #[arg(short = 'i', default_value = "./submission_best.csv")]
    input: PathBuf,

    /// Final output CSV
    #[arg(short = 'o', default_value = "best_submission.csv")]
    output: PathBuf,

    /// Annealing iterations per restart
    #[arg(short = 'n', default_value_t = 20_000)]
    iterations: usize,

    /// Restarts per group
    #[arg(short = 'r', default_value_t = 80)]
    restarts: usize,

    /// Smallest group size to optimize
    #[arg(long, default_value_t = 1)]
    min_n: usize,

    /// Largest group size to optimize
    #[arg(long, default_value_t = 200)]
    max_n: usize,

    /// Generation cap
    #[arg(long = "max-gens", default_value_t = 3)]
    max_gens: usize,

    /// Stop after this many generations without global improvement
    #[arg(long = "max-noimprove", default_value_t = 10)]
    max_noimprove: usize,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Base seed for all per-restart RNGs
    #[arg(long = "seed-base", default_value_t = 0)]
    seed_base: u64,

    /// Restarts seeded from random layouts instead of the incumbent
    #[arg(long = "random-inits", default_value_t = 0)]
    random_inits: usize,

    /// Largest group size eligible for random seeding
    #[arg(long = "random-init-max-n", default_value_t = 12)]
    random_init_max_n: usize,

    /// Extent multiplier for the random placement square
    #[arg(long = "random-init-scale", default_value_t = 1.2)]
    random_init_scale: f64,

    /// Tries per random seed before falling back to the incumbent
    #[arg(long = "random-init-tries", default_value_t = 4)]
    random_init_tries: usize,

    /// Placement attempts per tree within one random try
    #[arg(long = "random-init-max-attempts", default_value_t = 2000)]
    random_init_max_attempts: usize,

    /// Compression steps applied to each restart seed (0 = off)
    #[arg(long = "compress-steps", default_value_t = 0)]
    compress_steps: usize,

    /// Shrink factor per compression step
    #[arg(long = "compress-factor", default_value_t = 0.99)]
    compress_factor: f64,

    /// Separation passes allowed per compression step
    #[arg(long = "compress-relax-iters", default_value_t = 60)]
    compress_relax_iters: usize,

    /// Separation step size during compression
    #[arg(long = "compress-relax-step", default_value_t = 0.02)]
    compress_relax_step: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut min_n = cli.min_n.max(1);
    let mut max_n = cli.max_n.min(io::MAX_GROUP);
    if min_n > max_n {
        std::mem::swap(&mut min_n, &mut max_n);
    }

    let config = DriverConfig {
        input: cli.input,
        output: cli.output,
        min_n,
        max_n,
        max_generations: cli.max_gens,
        max_no_improve: cli.max_noimprove,
        threads: cli.threads,
        solutions_dir: PathBuf::from("solutions"),
        optimizer: OptimizerConfig {
            restarts: cli.restarts,
            sa_iterations: cli.iterations,
            seed_base: cli.seed_base,
            random_inits: cli.random_inits,
            random_init_max_n: cli.random_init_max_n,
            random_init_scale: cli.random_init_scale,
            random_init_tries: cli.random_init_tries,
            random_init_max_attempts: cli.random_init_max_attempts,
            compress_steps: cli.compress_steps,
            compress_factor: cli.compress_factor,
            compress_relax_iters: cli.compress_relax_iters,
            compress_relax_step: cli.compress_relax_step,
        },
    };

    driver::run(&config)?;
    Ok(())
}
