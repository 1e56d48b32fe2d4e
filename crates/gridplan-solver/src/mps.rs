//! Free-format MPS reading and writing.
//!
//! The writer emits every declared row and column, and each column's
//! coefficients in insertion order, so a round trip reproduces the system.
//! Columns without coefficients get an explicit zero objective entry.

use std::io::{BufRead, Write};

use gridplan_core::{BoundEntry, BoundKind, Entry, RhsEntry, RowDecl, RowSense, OBJECTIVE_ROW};

use crate::error::{SolverError, SolverResult};
use crate::system::ConstraintSystem;

pub fn write_mps(system: &ConstraintSystem, mut out: impl Write) -> SolverResult<()> {
    writeln!(out, "NAME          {}", system.name())?;
    writeln!(out, "ROWS")?;
    writeln!(out, " N  {}", OBJECTIVE_ROW)?;
    for row in system.rows() {
        writeln!(out, " {}  {}", row.sense.letter(), row.name)?;
    }

    writeln!(out, "COLUMNS")?;
    for column in system.columns() {
        let entries = column.entries();
        if column.cost != 0.0 || entries.is_empty() {
            writeln!(out, "    {}  {}  {}", column.name, OBJECTIVE_ROW, column.cost)?;
        }
        for &(row, value) in entries {
            writeln!(out, "    {}  {}  {}", column.name, system.rows()[row].name, value)?;
        }
    }

    writeln!(out, "RHS")?;
    for row in system.rows() {
        if row.rhs != 0.0 {
            writeln!(out, "    RHS  {}  {}", row.name, row.rhs)?;
        }
    }

    writeln!(out, "BOUNDS")?;
    for column in system.columns() {
        let (lower, upper) = (column.lower, column.upper);
        if lower == upper {
            writeln!(out, " FX BND  {}  {}", column.name, lower)?;
            continue;
        }
        if lower == f64::NEG_INFINITY && upper == f64::INFINITY {
            writeln!(out, " FR BND  {}", column.name)?;
            continue;
        }
        if lower == f64::NEG_INFINITY {
            writeln!(out, " MI BND  {}", column.name)?;
        } else if lower != 0.0 {
            writeln!(out, " LO BND  {}  {}", column.name, lower)?;
        }
        if upper.is_finite() {
            writeln!(out, " UP BND  {}  {}", column.name, upper)?;
        }
    }
    writeln!(out, "ENDATA")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Header,
    Rows,
    Columns,
    Rhs,
    Bounds,
    End,
}

/// Read a free-format MPS model. The first `N` row is the objective; later
/// `N` rows are kept as free rows.
pub fn read_mps(input: impl BufRead) -> SolverResult<ConstraintSystem> {
    let mut system = ConstraintSystem::default();
    let mut section = Section::Header;
    let mut objective: Option<String> = None;

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        let number = number + 1;
        let err = |message: String| SolverError::Mps { line: number, message };
        if line.trim().is_empty() || line.starts_with('*') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if !line.starts_with(char::is_whitespace) {
            section = match tokens[0] {
                "NAME" => {
                    system = ConstraintSystem::new(tokens.get(1).copied().unwrap_or(""));
                    Section::Header
                }
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => Section::End,
                other => return Err(err(format!("unsupported section '{}'", other))),
            };
            continue;
        }

        match section {
            Section::Rows => {
                if tokens.len() != 2 {
                    return Err(err("expected '<sense> <row>'".to_string()));
                }
                let sense = RowSense::from_letter(tokens[0]).map_err(|e| err(e.to_string()))?;
                if sense == RowSense::Free && objective.is_none() {
                    objective = Some(tokens[1].to_string());
                    continue;
                }
                system
                    .add_row(&RowDecl::new(sense, tokens[1]))
                    .map_err(|e| err(e.to_string()))?;
            }
            Section::Columns => {
                if tokens.contains(&"'MARKER'") {
                    return Err(err("integer markers are not supported".to_string()));
                }
                if tokens.len() != 3 && tokens.len() != 5 {
                    return Err(err("expected '<column> <row> <value> [<row> <value>]'".to_string()));
                }
                for pair in tokens[1..].chunks(2) {
                    let value = parse_value(pair[1]).map_err(err)?;
                    let row = if objective.as_deref() == Some(pair[0]) {
                        OBJECTIVE_ROW
                    } else {
                        pair[0]
                    };
                    system
                        .add_entry(&Entry::new(tokens[0], row, value))
                        .map_err(|e| err(e.to_string()))?;
                }
            }
            Section::Rhs => {
                let pairs = match tokens.len() {
                    2 | 4 => &tokens[..],
                    3 | 5 => &tokens[1..],
                    _ => return Err(err("expected '[<set>] <row> <value>'".to_string())),
                };
                for pair in pairs.chunks(2) {
                    let value = parse_value(pair[1]).map_err(err)?;
                    if objective.as_deref() == Some(pair[0]) {
                        continue;
                    }
                    system
                        .set_rhs(&RhsEntry::new(pair[0], value))
                        .map_err(|e| err(e.to_string()))?;
                }
            }
            Section::Bounds => {
                let kind = BoundKind::from_code(tokens[0]).map_err(|e| err(e.to_string()))?;
                let expected = if kind.has_value() { 4 } else { 3 };
                if tokens.len() != expected {
                    return Err(err(format!("expected {} fields for {} bound", expected, tokens[0])));
                }
                let value = if kind.has_value() {
                    parse_value(tokens[3]).map_err(err)?
                } else {
                    0.0
                };
                system
                    .apply_bound(&BoundEntry::new(kind, tokens[2], value))
                    .map_err(|e| err(e.to_string()))?;
            }
            Section::Header | Section::End => {
                return Err(err("data outside of a section".to_string()));
            }
        }
    }

    if section != Section::End {
        return Err(SolverError::Mps {
            line: 0,
            message: "missing ENDATA".to_string(),
        });
    }
    Ok(system)
}

fn parse_value(token: &str) -> Result<f64, String> {
    token
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", token))
}
