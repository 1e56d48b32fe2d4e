use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gridplan_cli::{Cli, Commands};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let termination = match &cli.command {
        Commands::Build {
            network,
            config,
            out,
        } => {
            info!("Building models from {} into {}", network.display(), out.display());
            commands::build::handle(network, config, out)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Solve {
            network,
            config,
            out,
            min_investment,
        } => commands::solve::handle(network, config, out, min_investment.as_deref())?,
        Commands::Post { dir, config, out } => {
            commands::post::handle(dir, config, out.as_deref().unwrap_or(dir.as_path()))?
        }
    };
    Ok(commands::exit_code(termination))
}
