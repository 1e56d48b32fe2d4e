//! MPS-style model records.
//!
//! Arcs and nodes describe their share of the optimization model as plain
//! records: row declarations, column coefficients, right-hand sides and
//! bounds. The solver crate assembles them into a constraint system.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridplanError, GridplanResult};

/// Name of the objective row.
pub const OBJECTIVE_ROW: &str = "obj";

/// Row sense as written in the ROWS section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowSense {
    /// `E`: equality
    Equal,
    /// `L`: less than or equal
    Less,
    /// `G`: greater than or equal
    Greater,
    /// `N`: free (objective or unconstrained bookkeeping row)
    Free,
}

impl RowSense {
    pub fn letter(self) -> char {
        match self {
            RowSense::Equal => 'E',
            RowSense::Less => 'L',
            RowSense::Greater => 'G',
            RowSense::Free => 'N',
        }
    }

    pub fn from_letter(letter: &str) -> GridplanResult<Self> {
        match letter {
            "E" => Ok(RowSense::Equal),
            "L" => Ok(RowSense::Less),
            "G" => Ok(RowSense::Greater),
            "N" => Ok(RowSense::Free),
            other => Err(GridplanError::Parse(format!("unknown row sense '{}'", other))),
        }
    }
}

/// A row declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDecl {
    pub name: String,
    pub sense: RowSense,
}

impl RowDecl {
    pub fn new(sense: RowSense, name: impl Into<String>) -> Self {
        Self { name: name.into(), sense }
    }
}

impl fmt::Display for RowDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sense.letter(), self.name)
    }
}

/// One coefficient of a column. The objective row takes objective costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub column: String,
    pub row: String,
    pub value: f64,
}

impl Entry {
    pub fn new(column: impl Into<String>, row: impl Into<String>, value: f64) -> Self {
        Self {
            column: column.into(),
            row: row.into(),
            value,
        }
    }

    pub fn is_objective(&self) -> bool {
        self.row == OBJECTIVE_ROW
    }
}

/// A right-hand-side value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhsEntry {
    pub row: String,
    pub value: f64,
}

impl RhsEntry {
    pub fn new(row: impl Into<String>, value: f64) -> Self {
        Self { row: row.into(), value }
    }
}

/// Bound types of the BOUNDS section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    /// `LO`
    Lower,
    /// `UP`
    Upper,
    /// `FX`
    Fixed,
    /// `FR`
    Free,
    /// `MI`
    MinusInfinity,
}

impl BoundKind {
    pub fn code(self) -> &'static str {
        match self {
            BoundKind::Lower => "LO",
            BoundKind::Upper => "UP",
            BoundKind::Fixed => "FX",
            BoundKind::Free => "FR",
            BoundKind::MinusInfinity => "MI",
        }
    }

    pub fn from_code(code: &str) -> GridplanResult<Self> {
        match code {
            "LO" => Ok(BoundKind::Lower),
            "UP" => Ok(BoundKind::Upper),
            "FX" => Ok(BoundKind::Fixed),
            "FR" => Ok(BoundKind::Free),
            "MI" => Ok(BoundKind::MinusInfinity),
            other => Err(GridplanError::Parse(format!("unknown bound type '{}'", other))),
        }
    }

    /// Whether the BOUNDS line carries a value.
    pub fn has_value(self) -> bool {
        matches!(self, BoundKind::Lower | BoundKind::Upper | BoundKind::Fixed)
    }
}

/// A column bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundEntry {
    pub kind: BoundKind,
    pub column: String,
    pub value: f64,
}

impl BoundEntry {
    pub fn new(kind: BoundKind, column: impl Into<String>, value: f64) -> Self {
        Self {
            kind,
            column: column.into(),
            value,
        }
    }

    pub fn lower(column: impl Into<String>, value: f64) -> Self {
        Self::new(BoundKind::Lower, column, value)
    }

    pub fn upper(column: impl Into<String>, value: f64) -> Self {
        Self::new(BoundKind::Upper, column, value)
    }
}
