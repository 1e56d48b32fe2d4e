//! Capacity links between master and subproblems, and the cuts built from
//! subproblem duals.

use gridplan_core::{DecompositionConfig, RowSense};
use gridplan_solver::{ConstraintSystem, LpSolution};

use crate::error::{EngineError, EngineResult};
use crate::index::VariableFamily;
use crate::model::{EventTable, PlanModels};

/// Bound row `cap <= rhs` installed in a subproblem for one capacity entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityLink {
    /// Position in the capacity family.
    pub entry: usize,
    /// Capacity column in the master.
    pub master_column: usize,
    /// Bound row in the year's subproblem.
    pub row: usize,
}

/// Every capacity link of a session, grouped by year.
#[derive(Debug, Clone, Default)]
pub struct CapacityLinks {
    by_year: Vec<Vec<CapacityLink>>,
    /// Rows of each subproblem before the links were installed.
    base_rows: Vec<usize>,
    master_columns: Vec<usize>,
}

impl CapacityLinks {
    /// Append a `capcut` row for every capacity entry to its year's
    /// subproblem. The rows start at zero until [`CapacityLinks::push`].
    pub fn install(models: &mut PlanModels) -> EngineResult<Self> {
        let years = models.subproblems.len();
        let mut links = Self {
            by_year: vec![Vec::new(); years],
            base_rows: models.subproblems.iter().map(|s| s.num_rows()).collect(),
            master_columns: Vec::new(),
        };

        for (entry, cap) in models.registry.get(VariableFamily::Capacity).iter().enumerate() {
            let year = cap.year as usize;
            let sub = year
                .checked_sub(1)
                .and_then(|y| models.subproblems.get_mut(y))
                .ok_or_else(|| {
                    EngineError::Inconsistent(format!("{} has no subproblem for year {}", cap.name, year))
                })?;
            let column = sub.column_index(&cap.name).ok_or_else(|| {
                EngineError::Inconsistent(format!("{} missing from {}", cap.name, sub.name()))
            })?;
            let code = cap.name.strip_prefix("cap").unwrap_or(&cap.name);
            let row = sub.add_constraint(format!("capcut{}", code), RowSense::Less, &[(column, 1.0)], 0.0)?;

            let master_column = models.master.column_index(&cap.name).ok_or_else(|| {
                EngineError::Inconsistent(format!("{} missing from master", cap.name))
            })?;
            links.master_columns.push(master_column);
            links.by_year[year - 1].push(CapacityLink {
                entry,
                master_column,
                row,
            });
        }
        Ok(links)
    }

    pub fn year(&self, year: u32) -> &[CapacityLink] {
        year.checked_sub(1)
            .and_then(|y| self.by_year.get(y as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `row` of the year's subproblem is a link row.
    pub fn is_link_row(&self, year: u32, row: usize) -> bool {
        year.checked_sub(1)
            .and_then(|y| self.base_rows.get(y as usize))
            .map(|&base| row >= base)
            .unwrap_or(false)
    }

    /// Phase-one copy of the year's subproblem with every row but the link
    /// rows made elastic.
    pub fn elastic(&self, year: u32, sub: &ConstraintSystem) -> ConstraintSystem {
        sub.elastic(format!("{}_phase1", sub.name()), |row| !self.is_link_row(year, row))
    }

    /// Capacity values in family order read from a master primal.
    pub fn master_values(&self, primal: &[f64]) -> Vec<f64> {
        self.master_columns
            .iter()
            .map(|&c| primal.get(c).copied().unwrap_or(0.0))
            .collect()
    }

    /// Set every link row to `max(0, multiplier * capacity)` for `event`.
    pub fn push(
        &self,
        subproblems: &mut [ConstraintSystem],
        capacities: &[f64],
        events: &EventTable,
        event: usize,
    ) -> EngineResult<()> {
        for (year, links) in self.by_year.iter().enumerate() {
            let sub = &mut subproblems[year];
            for link in links {
                let capacity = capacities.get(link.entry).copied().ok_or_else(|| {
                    EngineError::Inconsistent(format!(
                        "no value for capacity entry {} of {}",
                        link.entry,
                        capacities.len()
                    ))
                })?;
                let rhs = (events.multiplier(link.entry, event) * capacity).max(0.0);
                sub.set_row_rhs(link.row, rhs)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    Optimality,
    Feasibility,
}

/// A master row `sum(coef * x) >= rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub name: String,
    pub kind: CutKind,
    pub year: u32,
    pub coefficients: Vec<(usize, f64)>,
    pub rhs: f64,
}

impl Cut {
    /// Build the cut of `year` from a solve of its subproblem (optimality)
    /// or of the phase-one copy (feasibility): `theta_y` (optimality only)
    /// minus the link duals times capacity is at least the dual value of
    /// every other row and bound.
    pub fn from_duals(
        kind: CutKind,
        year: u32,
        iteration: usize,
        sub: &ConstraintSystem,
        solution: &LpSolution,
        links: &CapacityLinks,
    ) -> Self {
        let mut coefficients = Vec::with_capacity(links.year(year).len() + 1);
        if kind == CutKind::Optimality {
            coefficients.push((year as usize - 1, 1.0));
        }
        for link in links.year(year) {
            let dual = solution.row_duals.get(link.row).copied().unwrap_or(0.0);
            if dual != 0.0 {
                coefficients.push((link.master_column, -dual));
            }
        }
        let rhs = solution.dual_bound_value(sub, |row| links.is_link_row(year, row));
        Self {
            name: format!("Cut_y{}_iter{}", year, iteration),
            kind,
            year,
            coefficients,
            rhs,
        }
    }

    pub fn apply(&self, master: &mut ConstraintSystem) -> EngineResult<usize> {
        Ok(master.add_constraint(self.name.clone(), RowSense::Greater, &self.coefficients, self.rhs)?)
    }
}

/// Whether the master's estimate undershoots the realized cost enough to
/// warrant an optimality cut.
pub fn needs_optimality_cut(estimate: f64, realized: f64, settings: &DecompositionConfig) -> bool {
    let slack = (1.0 - settings.optimality_tolerance) * realized.abs() + settings.absolute_tolerance;
    estimate < realized - slack
}
