//! Constraint systems and LP solving for gridplan.
//!
//! Model builders emit named rows, coefficients, right-hand sides and
//! bounds; this crate collects them into a [`ConstraintSystem`], reads and
//! writes it as MPS, and solves it through an [`LpBackend`].
//!
//! ```text
//! records ──► ConstraintSystem ──► write_mps / read_mps
//!                     │
//!                     ▼
//!               LpBackend::solve ──► LpSolution (primal, duals, status)
//! ```

pub mod backend;
pub mod clarabel;
pub mod error;
pub mod mps;
pub mod solution;
pub mod system;

pub use backend::{LpBackend, SearchStrategy};
pub use clarabel::ClarabelBackend;
pub use error::{SolverError, SolverResult};
pub use mps::{read_mps, write_mps};
pub use solution::{LpSolution, SolutionStatus};
pub use system::{Column, ConstraintSystem, Row};
