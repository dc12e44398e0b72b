//! Simulation driver: runs a network for its configured number of steps and
//! collects spike rasters and probe traces

use crate::{error::*, network::Network};
use compass_storage::SpikeArchive;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Default decay constant of [`SimulationResult::smoothed_rate`]
pub const DEFAULT_RATE_DECAY: f64 = 721.5;

/// A scalar observable sampled during a run
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// Average membrane voltage of a neuron cluster (mV)
    MeanVoltage(String),
    /// Average gating of the synapse from `pre` to `post`
    MeanGating {
        /// Presynaptic cluster
        pre: String,
        /// Postsynaptic cluster
        post: String,
    },
    /// Average current the synapse from `pre` drives into `post` (pA)
    SynapseCurrent {
        /// Presynaptic cluster
        pre: String,
        /// Postsynaptic cluster
        post: String,
    },
}

impl Probe {
    /// Mean voltage probe
    pub fn mean_voltage(cluster: impl Into<String>) -> Self {
        Self::MeanVoltage(cluster.into())
    }

    /// Mean gating probe
    pub fn mean_gating(pre: impl Into<String>, post: impl Into<String>) -> Self {
        Self::MeanGating {
            pre: pre.into(),
            post: post.into(),
        }
    }

    /// Synaptic current probe
    pub fn synapse_current(pre: impl Into<String>, post: impl Into<String>) -> Self {
        Self::SynapseCurrent {
            pre: pre.into(),
            post: post.into(),
        }
    }

    fn sample(&self, network: &Network) -> Result<f64> {
        match self {
            Self::MeanVoltage(name) => Ok(network.neuron(name)?.mean_voltage()),
            Self::MeanGating { pre, post } => Ok(network.synapse(pre, post)?.mean_gating()),
            Self::SynapseCurrent { pre, post } => {
                let voltage = network.neuron(post)?.voltage();
                let current = network.synapse(pre, post)?.current(voltage);
                Ok(current.mean().unwrap_or(0.0))
            }
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeanVoltage(name) => write!(f, "V({})", name),
            Self::MeanGating { pre, post } => write!(f, "s({}->{})", pre, post),
            Self::SynapseCurrent { pre, post } => write!(f, "I({}->{})", pre, post),
        }
    }
}

/// What to record during a run
#[derive(Debug, Clone)]
pub struct RecordingParams {
    /// Sample probes every this many steps
    pub record_stride: u64,
    /// Probes to sample
    pub probes: Vec<Probe>,
    /// Enable per-step timing
    pub perf_enabled: bool,
}

impl Default for RecordingParams {
    fn default() -> Self {
        Self {
            record_stride: 1,
            probes: Vec::new(),
            perf_enabled: false,
        }
    }
}

impl RecordingParams {
    /// Set the probe sampling stride
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.record_stride = stride;
        self
    }

    /// Add a probe
    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probes.push(probe);
        self
    }

    /// Enable or disable performance sampling
    pub fn with_perf(mut self, enabled: bool) -> Self {
        self.perf_enabled = enabled;
        self
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.record_stride == 0 {
            return Err(RuntimeError::invalid_parameter("record_stride", "0", "> 0"));
        }
        Ok(())
    }
}

/// Samples of one probe
#[derive(Debug, Clone)]
pub struct Trace {
    /// Sampled probe
    pub probe: Probe,
    /// One value per entry of [`SimulationResult::trace_times`]
    pub values: Vec<f64>,
}

/// Performance metrics collected during simulation steps.
/// Present when [`RecordingParams::with_perf`] is enabled.
#[derive(Debug, Clone)]
pub struct PerfReport {
    /// Average step time in nanoseconds
    pub avg_step_ns: u64,
    /// Max step time in nanoseconds
    pub max_step_ns: u64,
    /// Steps sampled
    pub steps: usize,
}

impl PerfReport {
    fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sum: u128 = samples.iter().map(|&v| v as u128).sum();
        Some(Self {
            avg_step_ns: (sum / samples.len() as u128) as u64,
            max_step_ns: samples.iter().copied().max().unwrap_or(0),
            steps: samples.len(),
        })
    }
}

/// Simulation results
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Simulation time of step 0 (s)
    pub start_time: f64,
    /// Step size (s)
    pub dt: f64,
    /// Simulation time of every executed step
    pub time_axis: Vec<f64>,
    /// Per cluster, the step indices at which any unit fired
    pub firing: BTreeMap<String, Vec<u64>>,
    /// Per cluster, the number of units that fired at each entry of `firing`
    pub unit_spikes: BTreeMap<String, Vec<u32>>,
    /// Units per cluster
    pub sizes: BTreeMap<String, usize>,
    /// Times at which probes were sampled
    pub trace_times: Vec<f64>,
    /// Probe samples
    pub traces: Vec<Trace>,
    /// Number of steps executed
    pub steps_executed: u64,
    /// Total spike count over all units
    pub total_spikes: u64,
    /// Optional performance report
    pub perf: Option<PerfReport>,
}

impl SimulationResult {
    /// Step indices at which `cluster` fired
    pub fn spikes_for(&self, cluster: &str) -> Option<&[u64]> {
        self.firing.get(cluster).map(Vec::as_slice)
    }

    /// Times at which `cluster` fired (s)
    pub fn spike_times(&self, cluster: &str) -> Option<Vec<f64>> {
        self.spikes_for(cluster).map(|indices| {
            indices
                .iter()
                .map(|&i| self.start_time + i as f64 * self.dt)
                .collect()
        })
    }

    /// Spikes emitted by all units of `cluster`
    pub fn spike_count(&self, cluster: &str) -> Option<u64> {
        self.unit_spikes
            .get(cluster)
            .map(|counts| counts.iter().map(|&c| c as u64).sum())
    }

    /// Simulated duration (s)
    pub fn duration(&self) -> f64 {
        self.steps_executed as f64 * self.dt
    }

    /// Mean firing rate of one unit of `cluster` (Hz)
    pub fn firing_rate(&self, cluster: &str) -> Option<f64> {
        let count = self.spike_count(cluster)?;
        let size = *self.sizes.get(cluster)?;
        let duration = self.duration();
        if duration <= 0.0 {
            return Some(0.0);
        }
        Some(count as f64 / (size as f64 * duration))
    }

    /// [`smoothed_rate`](Self::smoothed_rate) with [`DEFAULT_RATE_DECAY`] over
    /// every recorded step
    pub fn rate_trace(&self, cluster: &str) -> Option<Vec<f64>> {
        self.smoothed_rate(cluster, DEFAULT_RATE_DECAY, &self.time_axis)
    }

    /// Exponentially filtered per-unit rate of `cluster` evaluated at `times`.
    ///
    /// Each spike at time `t` contributes `exp(-(ts - t) / decay)` for
    /// `ts > t`, and half of that at `ts == t`.
    pub fn smoothed_rate(&self, cluster: &str, decay: f64, times: &[f64]) -> Option<Vec<f64>> {
        let indices = self.firing.get(cluster)?;
        let counts = self.unit_spikes.get(cluster)?;
        let size = *self.sizes.get(cluster)? as f64;
        let rate = times
            .iter()
            .map(|&ts| {
                let total: f64 = indices
                    .iter()
                    .zip(counts)
                    .map(|(&i, &count)| {
                        let t = self.start_time + i as f64 * self.dt;
                        let step = if ts > t {
                            1.0
                        } else if ts == t {
                            0.5
                        } else {
                            0.0
                        };
                        count as f64 * step * (-(ts - t) / decay).exp()
                    })
                    .sum();
                total / size
            })
            .collect();
        Some(rate)
    }

    /// Samples of `probe`, if it was recorded
    pub fn trace(&self, probe: &Probe) -> Option<&[f64]> {
        self.traces
            .iter()
            .find(|trace| &trace.probe == probe)
            .map(|trace| trace.values.as_slice())
    }

    /// Persistable form: time axis and per-cluster firing indices
    pub fn to_archive(&self) -> SpikeArchive {
        SpikeArchive {
            start_time: self.start_time,
            dt: self.dt,
            time_axis: self.time_axis.clone(),
            firing: self.firing.clone(),
            sizes: self.sizes.clone(),
        }
    }
}

/// Simulation engine
#[derive(Debug)]
pub struct SimulationEngine {
    /// Network being simulated
    network: Network,
    /// What to record
    recording: RecordingParams,
    /// Per-step timing samples (ns), captured when perf_enabled
    perf_samples: Vec<u64>,
}

impl SimulationEngine {
    /// Create a new simulation engine
    pub fn new(network: Network, recording: RecordingParams) -> Result<Self> {
        recording.validate()?;
        for probe in &recording.probes {
            probe.sample(&network)?;
        }
        Ok(Self {
            network,
            recording,
            perf_samples: Vec::new(),
        })
    }

    /// Run the complete simulation
    pub fn run(&mut self) -> Result<SimulationResult> {
        self.run_with(|_, _| {})
    }

    /// Run the complete simulation, calling `progress(done, total)` after every step
    pub fn run_with<F>(&mut self, mut progress: F) -> Result<SimulationResult>
    where
        F: FnMut(u64, u64),
    {
        let params = *self.network.params();
        let num_steps = params.num_steps;
        log::info!(
            "Starting simulation: {} steps of {}s from t={}s ({} clusters, {} synapses)",
            num_steps,
            params.dt,
            params.start_time,
            self.network.cluster_count(),
            self.network.synapse_count()
        );

        self.network.reset()?;
        self.perf_samples.clear();

        let names: Vec<String> = self.network.nodes().map(str::to_string).collect();
        let mut unit_spikes: Vec<Vec<u32>> = vec![Vec::new(); names.len()];
        let mut trace_times = Vec::new();
        let mut traces: Vec<Trace> = self
            .recording
            .probes
            .iter()
            .map(|probe| Trace {
                probe: probe.clone(),
                values: Vec::new(),
            })
            .collect();

        let report_every = (num_steps / 10).max(1);
        for step in 0..num_steps {
            let step_start = Instant::now();

            self.network.update()?;

            for (counts, cluster) in unit_spikes.iter_mut().zip(self.network.clusters()) {
                let fired = cluster.firing().iter().filter(|&&f| f).count() as u32;
                if fired > 0 {
                    counts.push(fired);
                }
            }

            if step % self.recording.record_stride == 0 && !traces.is_empty() {
                trace_times.push(self.network.time());
                for trace in &mut traces {
                    trace.values.push(trace.probe.sample(&self.network)?);
                }
            }

            if self.recording.perf_enabled {
                self.perf_samples.push(step_start.elapsed().as_nanos() as u64);
            }

            if step % report_every == 0 {
                log::debug!(
                    "Simulation progress: {:.1}%",
                    step as f64 / num_steps as f64 * 100.0
                );
            }
            progress(step + 1, num_steps);
        }

        let mut result = SimulationResult {
            start_time: params.start_time,
            dt: params.dt,
            time_axis: (0..num_steps).map(|i| params.time_at(i)).collect(),
            firing: BTreeMap::new(),
            unit_spikes: BTreeMap::new(),
            sizes: BTreeMap::new(),
            trace_times,
            traces,
            steps_executed: num_steps,
            total_spikes: 0,
            perf: None,
        };
        for ((name, counts), cluster) in names.into_iter().zip(unit_spikes).zip(self.network.clusters()) {
            result.total_spikes += counts.iter().map(|&c| c as u64).sum::<u64>();
            result.sizes.insert(name.clone(), cluster.size());
            result.firing.insert(name.clone(), cluster.firing_time_indices().to_vec());
            result.unit_spikes.insert(name, counts);
        }

        log::info!(
            "Simulation completed: {} spikes in {} steps",
            result.total_spikes,
            result.steps_executed
        );

        if self.recording.perf_enabled {
            result.perf = PerfReport::from_samples(&self.perf_samples);
        }

        Ok(result)
    }

    /// Get reference to network
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Get mutable reference to network
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Recording parameters
    pub fn recording(&self) -> &RecordingParams {
        &self.recording
    }

    /// Take back the network
    pub fn into_network(self) -> Network {
        self.network
    }
}

/// Run a network for its configured number of steps
pub fn run_fixed(network: Network, recording: RecordingParams) -> Result<SimulationResult> {
    let mut engine = SimulationEngine::new(network, recording)?;
    engine.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        input::InputNeuronCluster,
        network::{NetworkBuilder, SimParams},
        neuron::{NeuronCluster, NeuronParams},
        synapse::SynapseSpec,
    };

    fn pair_network(num_steps: u64) -> Network {
        NetworkBuilder::new()
            .with_params(SimParams::new(0.0, 1e-3, num_steps).unwrap())
            .add_neuron(InputNeuronCluster::new("cue", 4, 50.0).unwrap().with_interval(0.0, 0.1))
            .add_neuron(NeuronCluster::new("target", 2, NeuronParams::default()).unwrap())
            .add_synapse("cue", "target", SynapseSpec::acetylcholine(2.1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_recording_params_validation() {
        assert!(RecordingParams::default().validate().is_ok());
        assert!(RecordingParams::default().with_stride(0).validate().is_err());
    }

    #[test]
    fn test_engine_rejects_unknown_probe() {
        let recording = RecordingParams::default().with_probe(Probe::mean_voltage("nope"));
        let err = SimulationEngine::new(pair_network(10), recording).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn test_input_raster_recorded() {
        let result = run_fixed(pair_network(200), RecordingParams::default()).unwrap();
        assert_eq!(result.steps_executed, 200);
        assert_eq!(result.time_axis.len(), 200);
        assert_eq!(result.spikes_for("cue").unwrap(), &[0, 20, 40, 60, 80]);
        assert_eq!(result.spike_count("cue"), Some(20));
        // 5 spikes per unit in 0.2 s
        assert!((result.firing_rate("cue").unwrap() - 25.0).abs() < 1e-9);
        assert!(result.spikes_for("missing").is_none());
    }

    #[test]
    fn test_probes_sampled_on_stride() {
        let recording = RecordingParams::default()
            .with_stride(10)
            .with_probe(Probe::mean_voltage("target"))
            .with_probe(Probe::mean_gating("cue", "target"))
            .with_probe(Probe::synapse_current("cue", "target"));
        let result = run_fixed(pair_network(100), recording).unwrap();
        assert_eq!(result.trace_times.len(), 10);

        let gating = result.trace(&Probe::mean_gating("cue", "target")).unwrap();
        // committed right after the first input spike
        assert_eq!(gating[0], 1.0);
        let current = result.trace(&Probe::synapse_current("cue", "target")).unwrap();
        assert!(current[0] < 0.0);
        let voltage = result.trace(&Probe::mean_voltage("target")).unwrap();
        assert!(voltage.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_smoothed_rate() {
        let mut result = run_fixed(pair_network(10), RecordingParams::default()).unwrap();
        result.firing.insert("x".into(), vec![0]);
        result.unit_spikes.insert("x".into(), vec![2]);
        result.sizes.insert("x".into(), 4);
        let rate = result.smoothed_rate("x", 1.0, &[-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(rate[0], 0.0);
        assert!((rate[1] - 0.25).abs() < 1e-12);
        assert!((rate[2] - 0.5 * (-1.0f64).exp()).abs() < 1e-12);

        let trace = result.rate_trace("x").unwrap();
        assert_eq!(trace.len(), result.time_axis.len());
        assert_eq!(trace, result.smoothed_rate("x", DEFAULT_RATE_DECAY, &result.time_axis).unwrap());
        assert!(result.rate_trace("missing").is_none());
    }

    #[test]
    fn test_perf_report() {
        let recording = RecordingParams::default().with_perf(true);
        let result = run_fixed(pair_network(20), recording).unwrap();
        let perf = result.perf.unwrap();
        assert_eq!(perf.steps, 20);
        assert!(perf.max_step_ns >= perf.avg_step_ns);
    }

    #[test]
    fn test_to_archive() {
        let result = run_fixed(pair_network(50), RecordingParams::default()).unwrap();
        let archive = result.to_archive();
        assert_eq!(archive.time_axis.len(), 50);
        assert_eq!(archive.firing["cue"], vec![0, 20, 40]);
        assert_eq!(archive.sizes["target"], 2);
    }
}
