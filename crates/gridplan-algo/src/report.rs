//! Result files and derived indicators of a planning session.
//!
//! Each variable family is written to its own `post_*.csv` file: the
//! family header on the first line, then one `name,year,value` record per
//! solution entry. Goal values go to `FinalObjectives.csv`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::benders::PlanSolution;
use crate::error::EngineResult;
use crate::index::{IndexRegistry, VariableFamily};

pub const OBJECTIVES_FILE: &str = "FinalObjectives.csv";

/// First year after which emissions are scored against the corridor.
const FIRST_SCORED_YEAR: usize = 5;
/// Yearly growth of the upper corridor edge.
const CORRIDOR_INCREASE: f64 = 0.02;
/// Yearly fall of the lower corridor edge, as a share of year-1 emissions.
const CORRIDOR_REDUCTION: f64 = 0.02;

/// Write one `post_*.csv` file per non-empty family. Returns the number of
/// files written.
pub fn write_results(dir: &Path, registry: &IndexRegistry, values: &[f64]) -> EngineResult<usize> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;
    for family in VariableFamily::ALL {
        let index = registry.get(family);
        if index.is_empty() {
            continue;
        }
        let start = registry.start(family);
        let mut out = BufWriter::new(File::create(dir.join(family.result_file()))?);
        writeln!(out, "{}", family.header())?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        for (i, entry) in index.iter().enumerate() {
            let value = values.get(start + i).copied().unwrap_or(f64::NAN);
            writer.write_record([entry.name.clone(), entry.year.to_string(), value.to_string()])?;
        }
        writer.flush()?;
        written += 1;
    }
    info!(dir = %dir.display(), files = written, "Wrote result files");
    Ok(written)
}

/// Header line of the objectives file.
pub fn objectives_header(metrics: &[String], with_resilience: bool) -> String {
    let mut parts = vec!["Cost".to_string()];
    parts.extend(metrics.iter().cloned());
    if with_resilience {
        parts.push("Resiliency".to_string());
    }
    parts.join("/")
}

/// Write the goal vector, one value per line, under its header.
pub fn write_objectives(path: &Path, metrics: &[String], solution: &PlanSolution) -> EngineResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", objectives_header(metrics, solution.resilience.is_some()))?;
    for value in solution.objectives() {
        writeln!(out, "{}", value)?;
    }
    out.flush()?;
    Ok(())
}

/// Average position of yearly emissions inside a corridor that widens from
/// the first year's value: the upper edge grows 2% a year, the lower edge
/// falls by 2% of the first year's value a year. Only years after the fifth
/// are scored; `None` when no year is scored.
pub fn emission_index(series: &[f64]) -> Option<f64> {
    let first = *series.first()?;
    let reduction = CORRIDOR_REDUCTION * first;
    let mut lower = first;
    let mut upper = first;
    let mut sum = 0.0;
    let mut scored = 0usize;
    for (year, &value) in series.iter().enumerate().skip(1) {
        upper *= 1.0 + CORRIDOR_INCREASE;
        lower -= reduction;
        if year > FIRST_SCORED_YEAR {
            sum += (value - lower) / (upper - lower);
            scored += 1;
        }
    }
    if scored == 0 {
        return None;
    }
    let index = sum / scored as f64;
    index.is_finite().then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benders::{ResilienceReport, Termination};

    fn solution() -> PlanSolution {
        PlanSolution {
            termination: Termination::Converged,
            iterations: 2,
            optimality_cuts: 1,
            feasibility_cuts: 0,
            cost: 1620.0,
            metrics: vec![12.5],
            resilience: Some(ResilienceReport {
                event_costs: vec![4.0],
                value: 4.0,
                feasible: true,
            }),
            values: Vec::new(),
            investments: Vec::new(),
            emission_index: None,
            solve_time_ms: 0,
        }
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.get_mut(VariableFamily::Capacity).add(0, 0, 1, "capA");
        registry.get_mut(VariableFamily::Capacity).add(0, 1, 2, "capB");
        registry.get_mut(VariableFamily::Unserved).add(0, 0, 1, "UD_X");

        let written = write_results(dir.path(), &registry, &[1.5, 2.0, 0.25]).unwrap();
        assert_eq!(written, 2);
        let caps = std::fs::read_to_string(dir.path().join("post_arc_cap.csv")).unwrap();
        assert_eq!(caps, "% Capacity\ncapA,1,1.5\ncapB,2,2\n");
        let ud = std::fs::read_to_string(dir.path().join(VariableFamily::Unserved.result_file())).unwrap();
        assert!(ud.ends_with("UD_X,1,0.25\n"));
        assert!(!dir.path().join(VariableFamily::Flow.result_file()).exists());
    }

    #[test]
    fn test_write_objectives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECTIVES_FILE);
        write_objectives(&path, &["CO2".to_string()], &solution()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "Cost/CO2/Resiliency\n1620\n12.5\n4\n");
        assert_eq!(objectives_header(&[], false), "Cost");
    }

    #[test]
    fn test_emission_index() {
        assert_eq!(emission_index(&[]), None);
        assert_eq!(emission_index(&[100.0; 6]), None);

        // Year 6: upper = 100 * 1.02^6, lower = 100 - 6 * 2 = 88.
        let mut series = vec![100.0; 7];
        series[6] = 88.0;
        assert_eq!(emission_index(&series), Some(0.0));

        let upper = 100.0 * 1.02f64.powi(6);
        series[6] = upper;
        let index = emission_index(&series).unwrap();
        assert!((index - 1.0).abs() < 1e-12);

        assert_eq!(emission_index(&[0.0; 8]), None);
    }
}
