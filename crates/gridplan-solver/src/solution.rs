//! Solve outcomes.

use serde::{Deserialize, Serialize};

use crate::system::ConstraintSystem;
use gridplan_core::RowSense;

/// How an LP solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    Optimal,
    /// No point satisfies the rows and bounds; duals hold a certificate.
    Infeasible,
    Unbounded,
    IterationLimit,
    TimeLimit,
    /// The backend stalled or lost accuracy before reaching a verdict.
    NumericalError,
    /// The backend stopped without classifying the problem.
    Unsolved,
}

impl SolutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SolutionStatus::Optimal)
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::IterationLimit => "iteration_limit",
            SolutionStatus::TimeLimit => "time_limit",
            SolutionStatus::NumericalError => "numerical_error",
            SolutionStatus::Unsolved => "unsolved",
        };
        f.write_str(label)
    }
}

/// Primal and dual values of one LP solve.
///
/// Duals follow the shadow-price convention: the rate at which the optimal
/// objective changes when the row's right-hand side (or the column bound)
/// increases. For an infeasible problem the duals hold an infeasibility
/// certificate in the same convention, so [`LpSolution::dual_bound_value`]
/// is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub status: SolutionStatus,
    pub objective: f64,
    /// Column values in declaration order.
    pub primal: Vec<f64>,
    /// One dual per row; zero for free rows.
    pub row_duals: Vec<f64>,
    pub lower_duals: Vec<f64>,
    pub upper_duals: Vec<f64>,
    pub iterations: u32,
    pub solve_time_ms: u128,
}

impl LpSolution {
    /// A solution with the given status and every value zero.
    pub fn empty(status: SolutionStatus, rows: usize, columns: usize) -> Self {
        Self {
            status,
            objective: if status.is_success() { 0.0 } else { f64::NAN },
            primal: vec![0.0; columns],
            row_duals: vec![0.0; rows],
            lower_duals: vec![0.0; columns],
            upper_duals: vec![0.0; columns],
            iterations: 0,
            solve_time_ms: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_success()
    }

    /// Dual objective contribution of the right-hand sides and finite
    /// bounds, leaving out rows for which `skip` returns true.
    pub fn dual_bound_value(&self, system: &ConstraintSystem, skip: impl Fn(usize) -> bool) -> f64 {
        let mut total = 0.0;
        for (i, row) in system.rows().iter().enumerate() {
            if row.sense == RowSense::Free || skip(i) {
                continue;
            }
            total += self.row_duals.get(i).copied().unwrap_or(0.0) * row.rhs;
        }
        for (j, column) in system.columns().iter().enumerate() {
            if column.lower.is_finite() {
                total += self.lower_duals.get(j).copied().unwrap_or(0.0) * column.lower;
            }
            if column.upper.is_finite() && column.upper != column.lower {
                total += self.upper_duals.get(j).copied().unwrap_or(0.0) * column.upper;
            }
        }
        total
    }
}
