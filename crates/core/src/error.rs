//! Error types shared across the crate.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by submission I/O and the generation driver.
///
/// Infeasible tentative moves, failed perturbation repair, failed random
/// seeding and aborted compression are *not* errors: the optimizers
/// revert, fall back or keep their last feasible snapshot instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed row id '{0}' (expected NNN_i)")]
    MalformedId(String),

    #[error("invalid numeric field '{0}'")]
    InvalidNumber(String),

    #[error("no groups found in {0}")]
    EmptySubmission(String),

    #[error("group {0} not present in the submission")]
    MissingGroup(usize),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
