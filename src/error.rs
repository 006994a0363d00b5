//! Error taxonomy for the pipeline.
//!
//! Two tiers: `RunError` aborts the whole run before the report file exists
//! (bad configuration, malformed constraint file); `GeneError` is caught at
//! the per-gene pipeline boundary, logged, and the run continues with the
//! remaining genes.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal for the whole run. Checked/raised before any gene work starts.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A malformed constraint file invalidates every gene.
    #[error("constraint file {path}: {reason}")]
    ConstraintParse { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl RunError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RunError::Io { context: context.into(), source }
    }
}

/// Fatal for one gene (or one backend of one gene); never for the run.
#[derive(Debug, Error)]
pub enum GeneError {
    /// Unparseable tree or unparseable external-tool output.
    #[error("parse error: {0}")]
    Parse(String),

    /// Non-zero exit or missing expected output of an external invocation.
    #[error("external tool failed: {command}: {reason}")]
    ExternalTool { command: String, reason: String },

    #[error("external tool timed out after {secs}s: {command}")]
    Timeout { command: String, secs: u64 },

    /// No usable (non-empty) sequence records in the alignment.
    #[error("alignment has no usable sequence records")]
    EmptyAlignment,

    /// A hypothesis pruned to the gene's taxa has too few leaves left to
    /// constrain anything.
    #[error("hypothesis {index} shares fewer than 2 taxa with the alignment")]
    EmptyConstraint { index: usize },

    #[error("unsupported alignment format: {0}")]
    Format(String),

    #[error(transparent)]
    Rank(#[from] RankError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl GeneError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        GeneError::Io { context: context.into(), source }
    }
}

/// Best-hypothesis selection failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("cannot rank an empty hypothesis list")]
    NoHypotheses,

    #[error("hypothesis {index} shares no taxa with the unconstrained tree")]
    DisjointTaxa { index: usize },

    #[error("tree could not be encoded: {0}")]
    Encoding(String),
}
