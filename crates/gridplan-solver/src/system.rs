//! Sparse constraint system assembled from named rows and columns.
//!
//! Rows and columns keep their declaration order, which is also the order
//! of the MPS file and of the primal and dual vectors returned by a solve.
//!
//! ```text
//!            col 0   col 1   ...          sense   rhs
//!   obj      c_0     c_1                  N
//!   row 0    a_00    .                    E/L/G   b_0
//!   row 1    .       a_11                 E/L/G   b_1
//!   bounds   [l,u]   [l,u]
//! ```

use std::collections::HashMap;

use gridplan_core::{BoundEntry, BoundKind, Entry, RhsEntry, RowDecl, RowSense, OBJECTIVE_ROW};

use crate::error::{SolverError, SolverResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub sense: RowSense,
    pub rhs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cost: f64,
    pub lower: f64,
    pub upper: f64,
    entries: Vec<(usize, f64)>,
}

impl Column {
    fn new(name: String) -> Self {
        Self {
            name,
            cost: 0.0,
            lower: 0.0,
            upper: f64::INFINITY,
            entries: Vec::new(),
        }
    }

    /// Non-objective coefficients as `(row index, value)`, in insertion order.
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    fn add(&mut self, row: usize, value: f64) {
        match self.entries.iter_mut().find(|(r, _)| *r == row) {
            Some((_, existing)) => *existing += value,
            None => self.entries.push((row, value)),
        }
    }
}

/// A linear program with named rows and columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSystem {
    name: String,
    rows: Vec<Row>,
    row_lookup: HashMap<String, usize>,
    columns: Vec<Column>,
    column_lookup: HashMap<String, usize>,
}

impl ConstraintSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.row_lookup.get(name).copied()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_lookup.get(name).copied()
    }

    /// Declare a row. The objective row is implicit and cannot be declared.
    pub fn add_row(&mut self, decl: &RowDecl) -> SolverResult<usize> {
        if decl.name == OBJECTIVE_ROW || self.row_lookup.contains_key(&decl.name) {
            return Err(SolverError::DuplicateRow(decl.name.clone()));
        }
        let index = self.rows.len();
        self.rows.push(Row {
            name: decl.name.clone(),
            sense: decl.sense,
            rhs: 0.0,
        });
        self.row_lookup.insert(decl.name.clone(), index);
        Ok(index)
    }

    /// Declare a column, returning the existing index when already present.
    pub fn add_column(&mut self, name: &str) -> usize {
        if let Some(&index) = self.column_lookup.get(name) {
            return index;
        }
        let index = self.columns.len();
        self.columns.push(Column::new(name.to_string()));
        self.column_lookup.insert(name.to_string(), index);
        index
    }

    /// Add a coefficient. Repeated `(column, row)` pairs are summed and
    /// entries on the objective row accumulate into the column cost.
    pub fn add_entry(&mut self, entry: &Entry) -> SolverResult<()> {
        if entry.is_objective() {
            let column = self.add_column(&entry.column);
            self.columns[column].cost += entry.value;
            return Ok(());
        }
        let row = self
            .row_index(&entry.row)
            .ok_or_else(|| SolverError::UnknownRow {
                column: entry.column.clone(),
                row: entry.row.clone(),
            })?;
        let column = self.add_column(&entry.column);
        self.columns[column].add(row, entry.value);
        Ok(())
    }

    /// Set a right-hand side by row name. Values on the objective row are
    /// ignored.
    pub fn set_rhs(&mut self, rhs: &RhsEntry) -> SolverResult<()> {
        if rhs.row == OBJECTIVE_ROW {
            return Ok(());
        }
        let row = self
            .row_index(&rhs.row)
            .ok_or_else(|| SolverError::UnknownRow {
                column: "RHS".to_string(),
                row: rhs.row.clone(),
            })?;
        self.rows[row].rhs = rhs.value;
        Ok(())
    }

    pub fn set_row_rhs(&mut self, index: usize, value: f64) -> SolverResult<()> {
        let rows = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(SolverError::RowIndex { index, rows })?;
        row.rhs = value;
        Ok(())
    }

    pub fn apply_bound(&mut self, bound: &BoundEntry) -> SolverResult<()> {
        let index = self
            .column_index(&bound.column)
            .ok_or_else(|| SolverError::UnknownColumn(bound.column.clone()))?;
        let column = &mut self.columns[index];
        match bound.kind {
            BoundKind::Lower => column.lower = bound.value,
            BoundKind::Upper => column.upper = bound.value,
            BoundKind::Fixed => {
                column.lower = bound.value;
                column.upper = bound.value;
            }
            BoundKind::Free => {
                column.lower = f64::NEG_INFINITY;
                column.upper = f64::INFINITY;
            }
            BoundKind::MinusInfinity => column.lower = f64::NEG_INFINITY,
        }
        Ok(())
    }

    /// Append a row with its coefficients in one step.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        sense: RowSense,
        coefficients: &[(usize, f64)],
        rhs: f64,
    ) -> SolverResult<usize> {
        let row = self.add_row(&RowDecl::new(sense, name))?;
        for &(column, value) in coefficients {
            let count = self.columns.len();
            let target = self.columns.get_mut(column).ok_or_else(|| {
                SolverError::UnknownColumn(format!("#{} of {}", column, count))
            })?;
            target.add(row, value);
        }
        self.rows[row].rhs = rhs;
        Ok(row)
    }

    /// Drop every row from `len` onwards together with its coefficients.
    pub fn truncate_rows(&mut self, len: usize) {
        if len >= self.rows.len() {
            return;
        }
        for row in self.rows.drain(len..) {
            self.row_lookup.remove(&row.name);
        }
        for column in &mut self.columns {
            column.entries.retain(|(row, _)| *row < len);
        }
    }

    /// Phase-one copy of the system: zero costs on the original columns and
    /// a unit-cost slack on every row `relax` selects, signed so it can only
    /// close a violation (both directions on equalities). Rows keep their
    /// indices and the slacks follow the original columns, so the optimum
    /// is the least total violation and is zero exactly when the original
    /// rows can be met.
    pub fn elastic(
        &self,
        name: impl Into<String>,
        relax: impl Fn(usize) -> bool,
    ) -> ConstraintSystem {
        let mut system = self.clone();
        system.name = name.into();
        for column in &mut system.columns {
            column.cost = 0.0;
        }
        for (i, row) in self.rows.iter().enumerate() {
            if !relax(i) {
                continue;
            }
            let directions: &[(f64, &str)] = match row.sense {
                RowSense::Equal => &[(1.0, "up"), (-1.0, "dn")],
                RowSense::Greater => &[(1.0, "up")],
                RowSense::Less => &[(-1.0, "dn")],
                RowSense::Free => &[],
            };
            for &(sign, tag) in directions {
                let column = system.add_column(&format!("slack_{}_{}", tag, row.name));
                system.columns[column].cost = 1.0;
                system.columns[column].add(i, sign);
            }
        }
        system
    }

    /// Coefficients grouped by row: `(column index, value)` per row.
    pub fn row_entries(&self) -> Vec<Vec<(usize, f64)>> {
        let mut rows = vec![Vec::new(); self.rows.len()];
        for (j, column) in self.columns.iter().enumerate() {
            for &(row, value) in &column.entries {
                rows[row].push((j, value));
            }
        }
        rows
    }

    /// Coefficient of a column in a row, zero when absent.
    pub fn coefficient(&self, row: usize, column: usize) -> f64 {
        self.columns
            .get(column)
            .and_then(|c| c.entries.iter().find(|(r, _)| *r == row))
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConstraintSystem {
        let mut system = ConstraintSystem::new("sample");
        system.add_row(&RowDecl::new(RowSense::Greater, "demand")).unwrap();
        system.add_row(&RowDecl::new(RowSense::Less, "cap")).unwrap();
        system.add_entry(&Entry::new("x", OBJECTIVE_ROW, 3.0)).unwrap();
        system.add_entry(&Entry::new("x", "demand", 1.0)).unwrap();
        system.add_entry(&Entry::new("x", "cap", 1.0)).unwrap();
        system.add_entry(&Entry::new("y", "demand", 1.0)).unwrap();
        system
    }

    #[test]
    fn test_entries_accumulate() {
        let mut system = sample();
        system.add_entry(&Entry::new("x", "demand", 0.5)).unwrap();
        system.add_entry(&Entry::new("x", OBJECTIVE_ROW, 1.0)).unwrap();
        let x = system.column_index("x").unwrap();
        assert_eq!(system.coefficient(0, x), 1.5);
        assert_eq!(system.columns()[x].cost, 4.0);
    }

    #[test]
    fn test_unknown_row_is_an_error() {
        let mut system = sample();
        let err = system.add_entry(&Entry::new("x", "nowhere", 1.0)).unwrap_err();
        assert!(matches!(err, SolverError::UnknownRow { .. }));
        assert!(system.set_rhs(&RhsEntry::new("nowhere", 1.0)).is_err());
        assert!(system.set_rhs(&RhsEntry::new(OBJECTIVE_ROW, 1.0)).is_ok());
    }

    #[test]
    fn test_duplicate_row_is_an_error() {
        let mut system = sample();
        assert!(system.add_row(&RowDecl::new(RowSense::Equal, "cap")).is_err());
        assert!(system.add_row(&RowDecl::new(RowSense::Free, OBJECTIVE_ROW)).is_err());
    }

    #[test]
    fn test_bounds() {
        let mut system = sample();
        system.apply_bound(&BoundEntry::upper("x", 2.0)).unwrap();
        system.apply_bound(&BoundEntry::new(BoundKind::Free, "y", 0.0)).unwrap();
        assert_eq!(system.columns()[0].upper, 2.0);
        assert_eq!(system.columns()[1].lower, f64::NEG_INFINITY);
        assert!(system.apply_bound(&BoundEntry::lower("z", 1.0)).is_err());
    }

    #[test]
    fn test_add_constraint_and_truncate() {
        let mut system = sample();
        let x = system.column_index("x").unwrap();
        let y = system.column_index("y").unwrap();
        let row = system
            .add_constraint("cut", RowSense::Greater, &[(x, 2.0), (y, -1.0)], 5.0)
            .unwrap();
        assert_eq!(row, 2);
        assert_eq!(system.row_entries()[2], vec![(x, 2.0), (y, -1.0)]);
        assert_eq!(system.rows()[2].rhs, 5.0);

        system.truncate_rows(2);
        assert_eq!(system.num_rows(), 2);
        assert!(system.row_index("cut").is_none());
        assert_eq!(system.coefficient(2, x), 0.0);
        assert_eq!(system.columns()[x].entries().len(), 2);
    }

    #[test]
    fn test_elastic_copy() {
        let mut system = sample();
        system.add_row(&RowDecl::new(RowSense::Equal, "link")).unwrap();
        system.add_row(&RowDecl::new(RowSense::Free, "note")).unwrap();
        let elastic = system.elastic("phase1", |i| i != 1);

        assert_eq!(elastic.name(), "phase1");
        assert_eq!(elastic.rows(), system.rows());
        assert!(elastic.columns()[..2].iter().all(|c| c.cost == 0.0));
        let names: Vec<&str> = elastic.columns()[2..].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["slack_up_demand", "slack_up_link", "slack_dn_link"]);
        assert!(elastic.columns()[2..].iter().all(|c| c.cost == 1.0 && c.lower == 0.0));
        assert_eq!(elastic.coefficient(0, 2), 1.0);
        assert_eq!(elastic.coefficient(2, 4), -1.0);
        // The original keeps its costs and columns.
        assert_eq!(system.num_columns(), 2);
        assert_eq!(system.columns()[0].cost, 3.0);
    }

    #[test]
    fn test_row_rhs_by_index() {
        let mut system = sample();
        system.set_row_rhs(1, 7.0).unwrap();
        assert_eq!(system.rows()[1].rhs, 7.0);
        assert!(matches!(
            system.set_row_rhs(9, 1.0),
            Err(SolverError::RowIndex { index: 9, rows: 2 })
        ));
    }
}
