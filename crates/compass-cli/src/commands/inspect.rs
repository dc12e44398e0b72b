//! Circuit inspection command

use clap::Args;
use compass_connectome::{build_heading_network, Atlas};
use std::path::Path;
use tracing::{info, warn};

use super::load_experiment;
use crate::error::CliResult;

/// Build the circuit and print its topology
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Print every cluster and connection
    #[arg(short, long)]
    pub detailed: bool,

    /// Print the data warnings raised while building
    #[arg(long)]
    pub warnings: bool,
}

impl InspectCommand {
    pub fn execute(self, config: Option<&Path>) -> CliResult<()> {
        let experiment = load_experiment(config)?;
        let (net, report) = build_heading_network(&experiment, &Atlas::su_2017())?;
        let params = net.params();

        println!("Clusters: {}", net.cluster_count());
        println!("Synapse clusters: {}", net.synapse_count());
        println!("Connections: {}", net.connection_count());
        println!(
            "Steps: {} x {}s from t={}s",
            params.num_steps, params.dt, params.start_time
        );
        for (table, count) in &report.pathway_connections {
            println!("  {}: {} connections", table, count);
        }
        for applied in &report.overrides {
            println!(
                "Override {}: {} -> {} overlap {} replaced by {}",
                applied.table, applied.pre, applied.post, applied.measured, applied.count
            );
        }
        println!("Data warnings: {}", report.warnings.len());

        if self.warnings {
            for warning in &report.warnings {
                warn!("{}", warning);
                println!("  {}", warning);
            }
        }
        if self.detailed {
            println!("{}", net.summary());
        }

        info!("Inspection complete");
        Ok(())
    }
}
