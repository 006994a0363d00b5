//! Constrained tree searches and AU tests across gene alignments.
//!
//! For every gene alignment in an input directory, the pipeline runs one
//! unconstrained maximum-likelihood tree search plus one search per
//! hypothesis topology, ranks the hypotheses by Euclidean bipartition
//! distance to the unconstrained tree, and asks one or more external
//! backends for Approximately-Unbiased test p-values. Results land in a
//! single CSV table, a best-tree file, and a provenance log of every
//! external command executed.

pub mod alignment;
pub mod backends;
pub mod bitset;
pub mod config;
pub mod constraints;
pub mod error;
pub mod exec;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod snapshot;
pub mod topology;

pub use config::{AuChoice, MlChoice, RunConfig};
pub use error::{GeneError, RankError, RunError};
pub use pipeline::{RunSummary, run};
pub use ranking::{euclidean_distance, select_best_hypothesis};
