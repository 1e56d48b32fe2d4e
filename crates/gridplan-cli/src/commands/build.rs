use std::path::Path;

use anyhow::{Context, Result};
use gridplan_algo::ModelBuilder;
use gridplan_core::{ModelContext, Network};

use super::load_config;

pub fn handle(network_path: &Path, config_path: &Path, out: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let ctx = ModelContext::new(&config)?;
    let network = Network::from_path(network_path, &ctx)
        .with_context(|| format!("loading network from {}", network_path.display()))?;
    let models = ModelBuilder::new(&ctx, &network).build()?;
    models
        .save_dir(out)
        .with_context(|| format!("saving models to {}", out.display()))?;

    println!(
        "Wrote {} years: plan {} x {}, master {} x {}",
        models.years(),
        models.plan.num_rows(),
        models.plan.num_columns(),
        models.master.num_rows(),
        models.master.num_columns()
    );
    Ok(())
}
