use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridplan", author, version, about = "Multi-year energy network expansion planning", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the planning models and write them to a directory
    Build {
        /// Network document (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Planning configuration (TOML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Output directory for MPS, index and event files
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
    },
    /// Build and solve a plan, then write its results
    ///
    /// Exits with status 2 when the iteration limit stops the solve and 3
    /// when no feasible plan exists.
    Solve {
        /// Network document (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Planning configuration (TOML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Output directory for result files
        #[arg(short, long, default_value = "results", value_hint = ValueHint::DirPath)]
        out: PathBuf,
        /// File of minimum investments, one value per investment entry
        #[arg(long, value_hint = ValueHint::FilePath)]
        min_investment: Option<PathBuf>,
    },
    /// Solve models previously written by `build` and write their results
    Post {
        /// Directory written by `build`
        #[arg(long, value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Planning configuration used to build the models
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Output directory for result files (defaults to the model directory)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
    },
}
