//! Simulation command

use clap::Args;
use compass_connectome::{build_heading_network, Atlas};
use compass_runtime::{Probe, RecordingParams, SimulationEngine, SimulationResult};
use compass_storage::{write_archive, Compression};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::load_experiment;
use crate::error::{CliError, CliResult};

/// Simulate an experiment and store the spike raster
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Output spike archive
    #[arg(short, long, default_value = "results.cspk")]
    pub out: PathBuf,

    /// Run this many steps instead of the experiment's time window
    #[arg(long)]
    pub steps: Option<u64>,

    /// Record the mean voltage of these clusters
    #[arg(long = "probe-voltage", value_name = "CLUSTER")]
    pub probe_voltage: Vec<String>,

    /// Write probe traces as JSON to this path
    #[arg(long, requires = "probe_voltage")]
    pub traces: Option<PathBuf>,

    /// Store the archive without compression
    #[arg(long)]
    pub no_compression: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl RunCommand {
    pub fn execute(self, config: Option<&Path>) -> CliResult<()> {
        let experiment = load_experiment(config)?;
        let (mut net, report) = build_heading_network(&experiment, &Atlas::su_2017())?;
        if report.has_warnings() {
            warn!("{} data warnings while building the circuit", report.warnings.len());
        }

        if let Some(steps) = self.steps {
            let mut params = *net.params();
            params.num_steps = steps;
            net.set_params(params)?;
        }

        let recording = self
            .probe_voltage
            .iter()
            .fold(
                RecordingParams::default().with_stride(experiment.simulation.record_stride),
                |recording, name| recording.with_probe(Probe::mean_voltage(name.as_str())),
            );

        let total = net.params().num_steps;
        let mut engine = SimulationEngine::new(net, recording)?;
        let result = if self.no_progress {
            engine.run()?
        } else {
            let pb = progress_bar(total)?;
            let every = (total / 100).max(1);
            let result = engine.run_with(|done, total| {
                if done % every == 0 || done == total {
                    pb.set_position(done);
                }
            })?;
            pb.finish_and_clear();
            result
        };

        let compression = if self.no_compression {
            Compression::None
        } else {
            Compression::Lz4
        };
        write_archive(&self.out, &result.to_archive(), compression)?;
        info!("Wrote spike archive to {}", self.out.display());

        if let Some(path) = &self.traces {
            write_traces(path, &result)?;
            info!("Wrote probe traces to {}", path.display());
        }

        println!(
            "{} steps, {} spikes -> {}",
            result.steps_executed,
            result.total_spikes,
            self.out.display()
        );
        Ok(())
    }
}

fn progress_bar(total: u64) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} steps ({eta})")
        .map_err(anyhow::Error::from)?
        .progress_chars("#>-");
    pb.set_style(style);
    Ok(pb)
}

fn write_traces(path: &Path, result: &SimulationResult) -> CliResult<()> {
    let traces: serde_json::Map<String, serde_json::Value> = result
        .traces
        .iter()
        .map(|trace| (trace.probe.to_string(), json!(trace.values)))
        .collect();
    let document = json!({
        "times": result.trace_times,
        "traces": traces,
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .map_err(|e| CliError::output(path, e))?;
    serde_json::to_writer_pretty(file, &document)?;
    Ok(())
}
