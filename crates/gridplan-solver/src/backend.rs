//! The seam between model assembly and numerical solvers.

use serde::{Deserialize, Serialize};

use crate::error::SolverResult;
use crate::solution::LpSolution;
use crate::system::ConstraintSystem;

/// Search strategy requested for a solve.
///
/// Full models and Benders masters use `Dual`; subproblems use `Primal`.
/// Backends map the request to whatever knobs they have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    Dual,
    Primal,
}

/// An LP solver that can minimize a [`ConstraintSystem`].
///
/// Implementations must report duals for every row and both bound duals
/// for every column, and return an infeasibility certificate in
/// `row_duals`/`lower_duals`/`upper_duals` when the status is
/// [`crate::SolutionStatus::Infeasible`].
pub trait LpBackend {
    fn name(&self) -> &'static str;

    fn solve(&mut self, system: &ConstraintSystem, strategy: SearchStrategy) -> SolverResult<LpSolution>;
}

impl<B: LpBackend + ?Sized> LpBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&mut self, system: &ConstraintSystem, strategy: SearchStrategy) -> SolverResult<LpSolution> {
        (**self).solve(system, strategy)
    }
}
