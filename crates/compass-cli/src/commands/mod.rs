//! CLI command implementations for compass

use clap::{Parser, Subcommand};
use compass_connectome::ExperimentConfig;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CliError, CliResult};

pub mod init;
pub mod inspect;
pub mod run;
pub mod summary;

/// compass - spiking model of the fly heading-direction circuit
#[derive(Parser, Debug)]
#[command(
    name = "compass",
    version,
    about = "Spiking model of the fly heading-direction circuit",
    long_about = "compass builds the protocerebral bridge / ellipsoid body circuit from \
                  anatomical overlap tables, simulates it with leaky integrate-and-fire \
                  neuron clusters, and stores spike rasters as checksummed archives."
)]
pub struct CompassCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Experiment file (defaults to the built-in experiment)
    #[arg(short, long, global = true, env = "COMPASS_EXPERIMENT")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an experiment file with the default parameters
    #[command(alias = "new")]
    Init(init::InitCommand),

    /// Build the circuit and print its topology
    Inspect(inspect::InspectCommand),

    /// Simulate an experiment and store the spike raster
    Run(run::RunCommand),

    /// Print the contents of a spike archive
    Summary(summary::SummaryCommand),
}

impl CompassCli {
    /// Execute the CLI command
    pub fn execute(self) -> CliResult<()> {
        let config = self.config;
        match self.command {
            Commands::Init(cmd) => cmd.execute(),
            Commands::Inspect(cmd) => cmd.execute(config.as_deref()),
            Commands::Run(cmd) => cmd.execute(config.as_deref()),
            Commands::Summary(cmd) => cmd.execute(),
        }
    }
}

/// Load the experiment at `path`, or the default experiment
pub fn load_experiment(path: Option<&Path>) -> CliResult<ExperimentConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::missing_resource(format!(
                    "experiment file {}",
                    path.display()
                )));
            }
            info!("Loading experiment from {}", path.display());
            Ok(ExperimentConfig::load_from_file(path)?)
        }
        None => {
            info!("No experiment file given, using the default experiment");
            Ok(ExperimentConfig::default())
        }
    }
}
