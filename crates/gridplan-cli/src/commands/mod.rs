//! Subcommand handlers and the steps they share.

pub mod build;
pub mod post;
pub mod solve;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use gridplan_algo::report::{write_objectives, write_results, OBJECTIVES_FILE};
use gridplan_algo::{PlanModels, PlanSolution, Termination};
use gridplan_core::PlanConfig;
use serde::Serialize;
use tracing::{info, warn};

/// Printed on stdout after a solve.
#[derive(Debug, Serialize)]
struct SolveSummary<'a> {
    converged: bool,
    termination: Termination,
    iterations: usize,
    optimality_cuts: usize,
    feasibility_cuts: usize,
    objectives: Vec<f64>,
    investments: &'a [f64],
    emission_index: Option<f64>,
    solve_time_ms: u128,
}

pub fn load_config(path: &Path) -> Result<PlanConfig> {
    let config = PlanConfig::from_path(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    config.validate().context("validating configuration")?;
    Ok(config)
}

/// Process status of a finished session: 0 when converged, 2 at the
/// iteration limit, 3 when no feasible plan exists.
pub fn exit_code(termination: Termination) -> ExitCode {
    match termination {
        Termination::Converged => ExitCode::SUCCESS,
        Termination::IterationLimit => ExitCode::from(2),
        Termination::Infeasible => ExitCode::from(3),
    }
}

/// Write result files and the goal vector, then print the summary.
pub fn report(
    out: &Path,
    config: &PlanConfig,
    models: &PlanModels,
    solution: &PlanSolution,
) -> Result<Termination> {
    if solution.termination == Termination::Infeasible {
        warn!("No feasible plan; only objectives are written");
        std::fs::create_dir_all(out)?;
    } else {
        if solution.termination == Termination::IterationLimit {
            warn!("Results come from the last iteration before the limit");
        }
        write_results(out, &models.registry, &solution.values)
            .with_context(|| format!("writing results to {}", out.display()))?;
    }
    write_objectives(&out.join(OBJECTIVES_FILE), &config.metrics, solution)?;
    info!(dir = %out.display(), "Results written");

    let summary = SolveSummary {
        converged: solution.is_converged(),
        termination: solution.termination,
        iterations: solution.iterations,
        optimality_cuts: solution.optimality_cuts,
        feasibility_cuts: solution.feasibility_cuts,
        objectives: solution.objectives(),
        investments: &solution.investments,
        emission_index: solution.emission_index,
        solve_time_ms: solution.solve_time_ms,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(solution.termination)
}
