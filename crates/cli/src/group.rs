//! Single-group optimizer: re-anneals one group of a submission in place.
//!
//! The target group comes from the `GROUP_NUMBER` environment variable so
//! an external scheduler can fan the tool out one process per group. The
//! submission is rewritten only when the group strictly improves without
//! overlaps; otherwise the output file is left untouched.

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use treepack_core::{anneal, fractional_translation, io, local_search, Layout, SaConfig};

/// Required score gain before the submission is rewritten.
const MIN_IMPROVEMENT: f64 = 1e-12;

/// Restart seeds derive from this base.
const SEED_BASE: u64 = 1234;

/// Seed stride between restarts.
const SEED_STRIDE: u64 = 7777;

#[derive(Parser)]
#[command(name = "treepack-group")]
#[command(about = "Re-anneals the single group named by GROUP_NUMBER")]
#[command(version)]
struct Cli {
    /// Input submission CSV
    #[arg(short = 'i', default_value = "submission.csv")]
    input: PathBuf,

    /// Output submission CSV (written only on improvement)
    #[arg(short = 'o', default_value = "submission_optimized.csv")]
    output: PathBuf,

    /// Annealing iterations per restart
    #[arg(short = 'n', default_value_t = 50_000)]
    iterations: usize,

    /// Parallel restarts
    #[arg(short = 'r', default_value_t = 64)]
    restarts: usize,
}

/// Budget scaling per group size: small groups are cheap to anneal and
/// get more of everything, the largest groups get trimmed budgets.
fn scaled(n: usize, iterations: usize, restarts: usize) -> (usize, usize) {
    if n <= 10 {
        (iterations * 3, restarts * 3)
    } else if n <= 30 {
        (iterations * 2, restarts * 2)
    } else if n > 100 {
        (
            (iterations as f64 * 0.8) as usize,
            (restarts as f64 * 0.8) as usize,
        )
    } else {
        (iterations, restarts)
    }
}

/// Runs `restarts` independent anneal → refine pipelines in parallel and
/// returns the best result, ties resolved toward the earliest restart.
fn optimize_parallel(baseline: &Layout, iterations: usize, restarts: usize) -> Layout {
    let sa_config = SaConfig::default().with_iterations(iterations);
    let results: Vec<Layout> = (0..restarts)
        .into_par_iter()
        .map(|r| {
            let seed = SEED_BASE.wrapping_add(r as u64 * SEED_STRIDE);
            let annealed = anneal(baseline, &sa_config, seed);
            fractional_translation(&local_search(&annealed, 300), 150)
        })
        .collect();

    let mut best = baseline.clone();
    let mut best_score = best.score();
    for candidate in results {
        let score = candidate.score();
        if let Some(Ordering::Less) = score.partial_cmp(&best_score) {
            best_score = score;
            best = candidate;
        }
    }
    best
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let group: usize = std::env::var("GROUP_NUMBER")
        .context("GROUP_NUMBER environment variable not set")?
        .parse()
        .context("GROUP_NUMBER must be an integer")?;

    let mut groups = io::load_submission(&cli.input)?;
    let baseline = groups
        .get(&group)
        .ok_or(treepack_core::Error::MissingGroup(group))?
        .clone();

    let old_score = baseline.score();
    println!("Target N={} | Initial Score: {:.12}", group, old_score);

    let (iterations, restarts) = scaled(group, cli.iterations, cli.restarts);
    let candidate = optimize_parallel(&baseline, iterations, restarts.max(8));

    let new_score = candidate.score();
    if !candidate.any_overlap() && new_score < old_score - MIN_IMPROVEMENT {
        println!(
            ">>> IMPROVED N={}: {:.12} -> {:.12} ({:.5}%)",
            group,
            old_score,
            new_score,
            (old_score - new_score) / old_score * 100.0
        );
        groups.insert(group, candidate);
        io::save_submission(&cli.output, &groups)?;
    } else {
        println!("No improvement for N={}", group);
    }
    Ok(())
}
