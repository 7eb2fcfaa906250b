//! # treepack-core
//!
//! Stochastic search for compact, non-overlapping packings of N congruent
//! "tree" polygons (a fixed 15-vertex silhouette), one group per size
//! N = 1..=200. The per-group objective is `side² / N`, where `side` is
//! the longer edge of the axis-aligned bounding box around all placed
//! trees; a submission's total score is the sum over its groups.
//!
//! ## Core components
//!
//! - **Geometry**: [`TreePoly`], [`overlap`] - rigid template placement
//!   and the strict polygon-overlap predicate
//! - **Layout**: [`Layout`], [`Pose`] - one group's poses with cached
//!   polygons and the side/score/corner queries
//! - **Annealer**: [`SaConfig`], [`anneal`] - eight-operator simulated
//!   annealing with reject-to-best and reheating
//! - **Refinement**: [`local_search`], [`fractional_translation`] -
//!   deterministic multi-scale greedy descent
//! - **Seeding**: [`perturb`], [`compress_layout`], [`random_layout`],
//!   [`resolve_overlaps`] - diversification between restarts
//! - **Drivers**: [`optimize_group`], [`driver::run`] - the per-group
//!   multi-restart pipeline and the parallel generation loop
//!
//! ## Determinism
//!
//! Every stochastic routine takes an explicit seed and all seeds derive
//! from `(seed_base, restart, n)`, so a run with a fixed seed base
//! reproduces itself exactly regardless of worker scheduling.

pub mod driver;
pub mod error;
pub mod geometry;
pub mod io;
pub mod layout;
pub mod optimizer;
pub mod refine;
pub mod sa;
pub mod seeding;

pub use driver::DriverConfig;
pub use error::{Error, Result};
pub use geometry::{normalize_deg, overlap, Aabb, Point, TreePoly, TREE_XS, TREE_YS, VERTEX_COUNT};
pub use layout::{Layout, Pose};
pub use optimizer::{optimize_group, OptimizerConfig};
pub use refine::{fractional_translation, local_search};
pub use sa::{anneal, SaConfig};
pub use seeding::{compress_layout, perturb, random_layout, resolve_overlaps, scale_layout};
