use std::path::Path;

use anyhow::{Context, Result};
use gridplan_algo::{DecompositionEngine, ModelBuilder, Termination};
use gridplan_core::{ModelContext, Network};
use gridplan_solver::ClarabelBackend;
use tracing::info;

use super::{load_config, report};

pub fn handle(
    network_path: &Path,
    config_path: &Path,
    out: &Path,
    min_investment: Option<&Path>,
) -> Result<Termination> {
    let config = load_config(config_path)?;
    let ctx = ModelContext::new(&config)?;
    let network = Network::from_path(network_path, &ctx)
        .with_context(|| format!("loading network from {}", network_path.display()))?;
    let models = ModelBuilder::new(&ctx, &network).build()?;
    info!(
        years = models.years(),
        columns = models.plan.num_columns(),
        benders = config.use_benders,
        "Models built"
    );

    let mut engine = DecompositionEngine::new(ClarabelBackend::default(), models, &config)?;
    let solution = match min_investment {
        Some(path) => {
            let minimum = read_minimum(path)?;
            engine.solve_with_min_investment(&minimum)?
        }
        None => engine.solve()?,
    };
    report(out, &config, engine.models(), &solution)
}

/// Values separated by commas or whitespace.
pub fn read_minimum(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading minimum investments from {}", path.display()))?;
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .with_context(|| format!("invalid minimum investment '{}' in {}", t, path.display()))
        })
        .collect()
}
