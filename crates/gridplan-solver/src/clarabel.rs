//! LP backend on the Clarabel interior-point solver.
//!
//! The system is rewritten in Clarabel's conic form `Ax + s = b`:
//!
//! ```text
//!   E rows, fixed columns     -> zero cone
//!   L rows                    ->  a·x <= b      (nonnegative cone)
//!   G rows                    -> -a·x <= -b
//!   lower bounds              ->  -x <= -l
//!   upper bounds              ->   x <= u
//! ```
//!
//! Free rows are not passed on. Clarabel's dual `z` is mapped back to a
//! shadow price per original row or bound.

use clarabel::{
    algebra::CscMatrix,
    solver::{DefaultSettingsBuilder, IPSolver, SolverStatus, SupportedConeT},
};
use tracing::debug;
use web_time::Instant;

use crate::backend::{LpBackend, SearchStrategy};
use crate::error::{SolverError, SolverResult};
use crate::solution::{LpSolution, SolutionStatus};
use crate::system::ConstraintSystem;
use gridplan_core::RowSense;

/// Configuration for the Clarabel backend.
#[derive(Debug, Clone)]
pub struct ClarabelBackend {
    /// Maximum interior point iterations (default: 200)
    pub max_iter: u32,
    /// Primal/dual feasibility tolerance (default: 1e-8)
    pub tol_feas: f64,
    /// Duality gap tolerance (default: 1e-8)
    pub tol_gap: f64,
    /// Wall-clock limit per solve in seconds (default: none)
    pub time_limit: f64,
    /// Verbose solver output (default: false)
    pub verbose: bool,
}

impl Default for ClarabelBackend {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol_feas: 1e-8,
            tol_gap: 1e-8,
            time_limit: f64::INFINITY,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    /// Original row with the sign applied to it.
    Row(usize, f64),
    Lower(usize),
    Upper(usize),
    Fixed(usize),
}

struct ConicRow {
    origin: Origin,
    coefficients: Vec<(usize, f64)>,
    rhs: f64,
}

/// Split a system into equality and inequality cone rows.
fn conic_rows(system: &ConstraintSystem) -> (Vec<ConicRow>, Vec<ConicRow>) {
    let mut zero = Vec::new();
    let mut nonneg = Vec::new();
    for (i, (row, coefficients)) in system.rows().iter().zip(system.row_entries()).enumerate() {
        match row.sense {
            RowSense::Equal => zero.push(ConicRow {
                origin: Origin::Row(i, 1.0),
                coefficients,
                rhs: row.rhs,
            }),
            RowSense::Less => nonneg.push(ConicRow {
                origin: Origin::Row(i, 1.0),
                coefficients,
                rhs: row.rhs,
            }),
            RowSense::Greater => nonneg.push(ConicRow {
                origin: Origin::Row(i, -1.0),
                coefficients: coefficients.into_iter().map(|(j, v)| (j, -v)).collect(),
                rhs: -row.rhs,
            }),
            RowSense::Free => {}
        }
    }
    for (j, column) in system.columns().iter().enumerate() {
        if column.lower.is_finite() && column.lower == column.upper {
            zero.push(ConicRow {
                origin: Origin::Fixed(j),
                coefficients: vec![(j, 1.0)],
                rhs: column.lower,
            });
            continue;
        }
        if column.lower.is_finite() {
            nonneg.push(ConicRow {
                origin: Origin::Lower(j),
                coefficients: vec![(j, -1.0)],
                rhs: -column.lower,
            });
        }
        if column.upper.is_finite() {
            nonneg.push(ConicRow {
                origin: Origin::Upper(j),
                coefficients: vec![(j, 1.0)],
                rhs: column.upper,
            });
        }
    }
    (zero, nonneg)
}

fn map_status(status: SolverStatus) -> SolutionStatus {
    match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => SolutionStatus::Optimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolutionStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            SolutionStatus::Unbounded
        }
        SolverStatus::MaxIterations => SolutionStatus::IterationLimit,
        SolverStatus::MaxTime => SolutionStatus::TimeLimit,
        SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
            SolutionStatus::NumericalError
        }
        _ => SolutionStatus::Unsolved,
    }
}

impl LpBackend for ClarabelBackend {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&mut self, system: &ConstraintSystem, strategy: SearchStrategy) -> SolverResult<LpSolution> {
        let start = Instant::now();
        let n = system.num_columns();
        let (zero, nonneg) = conic_rows(system);
        let m = zero.len() + nonneg.len();

        if n == 0 || m == 0 {
            // Nothing couples the columns; each sits at a bound or the
            // objective is unbounded.
            let unbounded = system.columns().iter().any(|c| c.cost != 0.0);
            let status = if unbounded {
                SolutionStatus::Unbounded
            } else {
                SolutionStatus::Optimal
            };
            return Ok(LpSolution::empty(status, system.num_rows(), n));
        }

        let zero_count = zero.len();
        let rows: Vec<ConicRow> = zero.into_iter().chain(nonneg).collect();

        let mut by_column: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut rhs = Vec::with_capacity(m);
        for (k, row) in rows.iter().enumerate() {
            for &(j, v) in &row.coefficients {
                by_column[j].push((k, v));
            }
            rhs.push(row.rhs);
        }

        let mut col_ptr = Vec::with_capacity(n + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        col_ptr.push(0);
        for mut entries in by_column {
            entries.sort_by_key(|(k, _)| *k);
            for (k, v) in entries {
                row_idx.push(k);
                values.push(v);
            }
            col_ptr.push(row_idx.len());
        }

        let a_mat = CscMatrix::new(m, n, col_ptr, row_idx, values);
        let p_mat = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let obj: Vec<f64> = system.columns().iter().map(|c| c.cost).collect();

        let mut cones = Vec::with_capacity(2);
        if zero_count > 0 {
            cones.push(SupportedConeT::ZeroConeT(zero_count));
        }
        if m > zero_count {
            cones.push(SupportedConeT::NonnegativeConeT(m - zero_count));
        }

        let primal = matches!(strategy, SearchStrategy::Primal);
        let settings = DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iter)
            .time_limit(self.time_limit)
            .tol_feas(self.tol_feas)
            .tol_gap_abs(self.tol_gap)
            .tol_gap_rel(self.tol_gap)
            .presolve_enable(!primal)
            .equilibrate_enable(!primal)
            .build()
            .map_err(|e| SolverError::Backend(format!("Clarabel settings error: {:?}", e)))?;

        let mut solver =
            clarabel::solver::DefaultSolver::new(&p_mat, &obj, &a_mat, &rhs, &cones, settings)
                .map_err(|e| {
                    SolverError::Backend(format!("Clarabel initialization failed: {:?}", e))
                })?;

        solver.solve();

        let sol = solver.solution;
        let status = map_status(sol.status);
        debug!(
            system = system.name(),
            rows = m,
            columns = n,
            status = %status,
            iterations = sol.iterations,
            "Clarabel solve finished"
        );

        let mut solution = LpSolution::empty(status, system.num_rows(), n);
        solution.iterations = sol.iterations;
        solution.solve_time_ms = start.elapsed().as_millis();
        match status {
            SolutionStatus::Optimal => {
                solution.objective = sol.obj_val;
                solution.primal = sol.x.clone();
            }
            SolutionStatus::Infeasible => {
                solution.primal = vec![f64::NAN; n];
            }
            _ => return Ok(solution),
        }

        for (row, &z) in rows.iter().zip(sol.z.iter()) {
            match row.origin {
                Origin::Row(i, sign) => solution.row_duals[i] = -sign * z,
                Origin::Lower(j) => solution.lower_duals[j] = z,
                Origin::Upper(j) => solution.upper_duals[j] = -z,
                Origin::Fixed(j) => solution.lower_duals[j] = -z,
            }
        }
        Ok(solution)
    }
}
