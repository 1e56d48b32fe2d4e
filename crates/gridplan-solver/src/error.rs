//! Error types for constraint-system assembly and LP solves.

use thiserror::Error;

/// Errors that can occur while building, reading or solving a model.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A coefficient or right-hand side names a row that was never declared.
    #[error("column '{column}' references undeclared row '{row}'")]
    UnknownRow { column: String, row: String },

    /// A bound names a column that was never declared.
    #[error("bound on undeclared column '{0}'")]
    UnknownColumn(String),

    /// A row name was declared twice.
    #[error("row '{0}' declared twice")]
    DuplicateRow(String),

    /// A row index outside the system.
    #[error("row index {index} out of range ({rows} rows)")]
    RowIndex { index: usize, rows: usize },

    /// Malformed MPS input.
    #[error("MPS line {line}: {message}")]
    Mps { line: usize, message: String },

    /// The numerical backend failed to set up or run.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for solver results.
pub type SolverResult<T> = Result<T, SolverError>;
