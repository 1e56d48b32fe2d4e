use std::path::Path;

use anyhow::{Context, Result};
use gridplan_algo::{DecompositionEngine, PlanModels, Termination};
use gridplan_solver::ClarabelBackend;

use super::{load_config, report};

pub fn handle(dir: &Path, config_path: &Path, out: &Path) -> Result<Termination> {
    let config = load_config(config_path)?;
    let years = config.horizon()?.years();
    let models = PlanModels::load_dir(dir, years)
        .with_context(|| format!("loading models from {}", dir.display()))?;

    let mut engine = DecompositionEngine::new(ClarabelBackend::default(), models, &config)?;
    let solution = engine.solve()?;
    report(out, &config, engine.models(), &solution)
}
