//! Error types for model construction and decomposition sessions.

use std::path::PathBuf;

use gridplan_core::GridplanError;
use gridplan_solver::{SolutionStatus, SolverError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid network or configuration data.
    #[error(transparent)]
    Core(#[from] GridplanError),

    /// Constraint-system or backend failure.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Missing or malformed persisted index file.
    #[error("index file {}: {message}", path.display())]
    Index { path: PathBuf, message: String },

    /// A subproblem whose rows can be met but which no strategy solved.
    #[error("subproblem for year {year} could not be solved ({status})")]
    SubproblemUnsolved { year: u32, status: SolutionStatus },

    /// Session inputs that do not fit together.
    #[error("inconsistent models: {0}")]
    Inconsistent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
