//! Experiment file initialization command

use clap::Args;
use compass_connectome::ExperimentConfig;
use std::path::PathBuf;
use tracing::info;

use crate::error::{CliError, CliResult};

/// Write an experiment file with the default parameters
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Output path
    #[arg(short, long, default_value = "experiment.toml")]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn execute(self) -> CliResult<()> {
        if self.out.exists() && !self.force {
            return Err(CliError::invalid_args(format!(
                "{} already exists (use --force to overwrite)",
                self.out.display()
            )));
        }

        ExperimentConfig::default().save_to_file(&self.out)?;
        info!("Wrote default experiment to {}", self.out.display());
        println!("{}", self.out.display());
        Ok(())
    }
}
