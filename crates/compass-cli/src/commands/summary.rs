//! Spike archive summary command

use clap::Args;
use compass_storage::{read_archive, SpikeArchive};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::error::{CliError, CliResult};

/// Print the contents of a spike archive
#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// Spike archive to read
    #[arg(short, long, default_value = "results.cspk")]
    pub input: PathBuf,

    /// Only this cluster
    #[arg(long)]
    pub cluster: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ClusterSummary<'a> {
    name: &'a str,
    units: usize,
    firing_steps: usize,
    first_spike: Option<f64>,
    last_spike: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ArchiveSummary<'a> {
    start_time: f64,
    dt: f64,
    steps: usize,
    clusters: Vec<ClusterSummary<'a>>,
}

fn summarize<'a>(archive: &'a SpikeArchive, only: Option<&str>) -> CliResult<ArchiveSummary<'a>> {
    if let Some(name) = only {
        if archive.firing_for(name).is_none() {
            return Err(CliError::invalid_args(format!("no cluster {} in archive", name)));
        }
    }
    let time_of = |index: u64| archive.start_time + index as f64 * archive.dt;
    let clusters = archive
        .firing
        .iter()
        .filter(|(name, _)| only.map_or(true, |only| only == name.as_str()))
        .map(|(name, indices)| ClusterSummary {
            name: name.as_str(),
            units: archive.sizes.get(name).copied().unwrap_or(0),
            firing_steps: indices.len(),
            first_spike: indices.first().map(|&i| time_of(i)),
            last_spike: indices.last().map(|&i| time_of(i)),
        })
        .collect();
    Ok(ArchiveSummary {
        start_time: archive.start_time,
        dt: archive.dt,
        steps: archive.num_steps(),
        clusters,
    })
}

impl SummaryCommand {
    pub fn execute(self) -> CliResult<()> {
        if !self.input.exists() {
            return Err(CliError::missing_resource(format!(
                "spike archive {}",
                self.input.display()
            )));
        }
        let archive = read_archive(&self.input)?;
        info!("Read {} clusters from {}", archive.firing.len(), self.input.display());
        let summary = summarize(&archive, self.cluster.as_deref())?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!(
            "{} steps of {}s from t={}s",
            summary.steps, summary.dt, summary.start_time
        );
        println!("{:<14} {:>6} {:>13} {:>12} {:>12}", "cluster", "units", "firing steps", "first (s)", "last (s)");
        for cluster in &summary.clusters {
            let fmt_time = |t: Option<f64>| t.map_or_else(|| "-".to_string(), |t| format!("{:.6}", t));
            println!(
                "{:<14} {:>6} {:>13} {:>12} {:>12}",
                cluster.name,
                cluster.units,
                cluster.firing_steps,
                fmt_time(cluster.first_spike),
                fmt_time(cluster.last_spike)
            );
        }
        Ok(())
    }
}
