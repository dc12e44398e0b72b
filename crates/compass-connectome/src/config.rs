//! Experiment configuration
//!
//! Everything a heading-circuit experiment can change lives in one
//! [`ExperimentConfig`], stored as TOML. Missing sections fall back to the
//! published model values.

use crate::{
    error::*,
    overlap::{ConductanceFactors, OverlapOverrides},
};
use compass_runtime::{
    synapse::{
        ACETYLCHOLINE_REVERSAL_POTENTIAL, ACETYLCHOLINE_TIME_CONSTANT, GABAA_REVERSAL_POTENTIAL,
        GABAA_TIME_CONSTANT, NMDA_REVERSAL_POTENTIAL, NMDA_TIME_CONSTANT,
    },
    NeuronParams, NmdaParams, SimParams, SynapseKind, SynapseSpec,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Units per population
pub const DEFAULT_CLUSTER_SIZE: usize = 10;

/// Timing of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation time of the first step (s)
    pub start_time: f64,
    /// Simulation time at which the run stops (s)
    pub end_time: f64,
    /// Step size (s)
    pub dt: f64,
    /// Sample probes every this many steps
    pub record_stride: u64,
    /// Standard deviation of the membrane noise current, 0 for none
    pub noise_sd: f64,
    /// Seed of the noise sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 0.1,
            dt: 1e-6,
            record_stride: 1,
            noise_sd: 0.0,
            seed: None,
        }
    }
}

/// Neuron electrical parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronsConfig {
    /// Parameters of every population without an override
    pub default: NeuronParams,
    /// Per-population parameters, keyed by cluster name (`"REIP"`) or
    /// population kind (`"EIP"` covers `EIP0 .. EIP17`)
    pub overrides: BTreeMap<String, NeuronParams>,
}

impl NeuronsConfig {
    /// Parameters of the cluster `name`; an exact name beats its population kind
    pub fn params_for(&self, name: &str) -> NeuronParams {
        self.overrides
            .get(name)
            .or_else(|| self.overrides.get(population_kind(name)))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Population kind of a unit label: the label without its trailing index
pub fn population_kind(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Kinetics of one receptor kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceptorParams {
    /// Gating decay time constant (s)
    pub time_constant: f64,
    /// Reversal potential (mV)
    pub reversal_potential: f64,
}

/// Receptor kinds used by the circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receptor {
    /// Fast inhibition
    Gabaa,
    /// Fast excitation
    Acetylcholine,
    /// Slow voltage-gated excitation
    Nmda,
}

/// Kinetics of every receptor kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Receptors {
    /// GABA-A
    pub gabaa: ReceptorParams,
    /// Acetylcholine
    pub acetylcholine: ReceptorParams,
    /// NMDA
    pub nmda: ReceptorParams,
    /// NMDA saturation and magnesium block
    pub nmda_block: NmdaParams,
}

impl Default for Receptors {
    fn default() -> Self {
        Self {
            gabaa: ReceptorParams {
                time_constant: GABAA_TIME_CONSTANT,
                reversal_potential: GABAA_REVERSAL_POTENTIAL,
            },
            acetylcholine: ReceptorParams {
                time_constant: ACETYLCHOLINE_TIME_CONSTANT,
                reversal_potential: ACETYLCHOLINE_REVERSAL_POTENTIAL,
            },
            nmda: ReceptorParams {
                time_constant: NMDA_TIME_CONSTANT,
                reversal_potential: NMDA_REVERSAL_POTENTIAL,
            },
            nmda_block: NmdaParams::default(),
        }
    }
}

impl Receptors {
    /// Synapse spec for `receptor` with maximum conductance `max_conductance`
    pub fn spec(&self, receptor: Receptor, max_conductance: f64) -> SynapseSpec {
        let (kind, params) = match receptor {
            Receptor::Gabaa => (SynapseKind::Standard, self.gabaa),
            Receptor::Acetylcholine => (SynapseKind::Standard, self.acetylcholine),
            Receptor::Nmda => (SynapseKind::Nmda(self.nmda_block), self.nmda),
        };
        SynapseSpec::new(kind, params.time_constant, max_conductance, params.reversal_potential)
    }
}

/// Rate and size of an input population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Spike frequency while active (Hz)
    pub frequency: f64,
    /// Units, `cluster_size` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl InputSpec {
    /// Input at `frequency` with the default size
    pub fn at(frequency: f64) -> Self {
        Self {
            frequency,
            size: None,
        }
    }
}

/// Input populations by role, with per-input overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Visual landmark inputs, one per ellipsoid body tile
    pub visual: InputSpec,
    /// Rotation inputs `rot_CW` and `rot_CCW`
    pub rotation: InputSpec,
    /// Drive of the ring neurons, `RPEN_input` and `RPEI_input`
    pub ring: InputSpec,
    /// Per-input settings keyed by input name
    pub overrides: BTreeMap<String, InputSpec>,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            visual: InputSpec::at(50.0),
            rotation: InputSpec::at(3150.0),
            ring: InputSpec::at(200.0),
            overrides: BTreeMap::new(),
        }
    }
}

impl InputsConfig {
    /// Settings of the input `name` whose role default is `role`
    pub fn resolve(&self, name: &str, role: InputSpec) -> InputSpec {
        self.overrides.get(name).copied().unwrap_or(role)
    }
}

/// One heading-circuit experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Units per population
    pub cluster_size: usize,
    /// Timing
    pub simulation: SimulationConfig,
    /// Neuron parameters
    pub neurons: NeuronsConfig,
    /// Receptor kinetics
    pub receptors: Receptors,
    /// Conductance factor per population pair, keyed `"PRE->POST"`
    pub conductance_factors: ConductanceFactors,
    /// Input populations
    pub inputs: InputsConfig,
    /// Activation intervals `[start, end]` (s) per input name
    pub cues: BTreeMap<String, Vec<(f64, f64)>>,
    /// Overlap-count corrections
    pub overrides: OverlapOverrides,
}

impl Default for ExperimentConfig {
    /// A landmark at `EB-L1` for the first half of a 100 ms run, with the
    /// PEN ring neurons driven throughout
    fn default() -> Self {
        let mut cues = BTreeMap::new();
        cues.insert("EB-L1_input".to_string(), vec![(0.0, 0.05)]);
        cues.insert("RPEN_input".to_string(), vec![(0.0, 0.1)]);
        Self {
            cluster_size: DEFAULT_CLUSTER_SIZE,
            simulation: SimulationConfig::default(),
            neurons: NeuronsConfig::default(),
            receptors: Receptors::default(),
            conductance_factors: ConductanceFactors::default(),
            inputs: InputsConfig::default(),
            cues,
            overrides: OverlapOverrides::default(),
        }
    }
}

impl ExperimentConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConnectomeError::invalid_config(format!("Invalid experiment file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConnectomeError::invalid_config(format!("Failed to serialize experiment: {}", e)))
    }

    /// Load and validate an experiment file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Write the experiment to `path`, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Timing of the run
    pub fn sim_params(&self) -> Result<SimParams> {
        let sim = &self.simulation;
        Ok(SimParams::from_window(sim.start_time, sim.end_time, sim.dt)?)
    }

    /// Check values that the network would only reject later
    pub fn validate(&self) -> Result<()> {
        if self.cluster_size == 0 {
            return Err(ConnectomeError::invalid_config("cluster_size must be > 0"));
        }
        if self.simulation.record_stride == 0 {
            return Err(ConnectomeError::invalid_config("simulation.record_stride must be > 0"));
        }
        if !(self.simulation.noise_sd >= 0.0) {
            return Err(ConnectomeError::invalid_config("simulation.noise_sd must be >= 0"));
        }
        self.sim_params()?;
        self.neurons.default.validate()?;
        for params in self.neurons.overrides.values() {
            params.validate()?;
        }
        for (name, spec) in &self.inputs.overrides {
            if spec.size == Some(0) {
                return Err(ConnectomeError::invalid_config(format!("input {} has size 0", name)));
            }
        }
        for (name, intervals) in &self.cues {
            if let Some(&(start, end)) = intervals.iter().find(|(start, end)| !(end >= start)) {
                return Err(ConnectomeError::invalid_config(format!(
                    "cue for {} ends before it starts: ({}, {})",
                    name, start, end
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_experiment() {
        let config = ExperimentConfig::default();
        assert_eq!(config.cluster_size, 10);
        assert_eq!(config.sim_params().unwrap().num_steps, 100_000);
        assert_eq!(config.cues["EB-L1_input"], vec![(0.0, 0.05)]);
        assert_eq!(config.overrides.lookup("PEN_EIP", "PEN7", "EIP0"), Some(3));
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = ExperimentConfig::default();
        config.simulation.seed = Some(7);
        config.neurons.overrides.insert("REIP".into(), NeuronParams::reip());
        config.inputs.overrides.insert("rot_CW".into(), InputSpec { frequency: 1000.0, size: Some(4) });

        let text = config.to_toml_string().unwrap();
        let parsed = ExperimentConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            cluster_size = 4

            [simulation]
            end_time = 0.01
            dt = 1e-4

            [conductance_factors]
            "EIP->PEI" = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.cluster_size, 4);
        assert_eq!(config.sim_params().unwrap().num_steps, 100);
        assert_eq!(config.conductance_factors.get("EIP", "PEI"), Some(2.5));
        // a replaced table replaces every entry
        assert_eq!(config.conductance_factors.get("EIP", "PEN"), None);
        assert_eq!(config.inputs.visual.frequency, 50.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ExperimentConfig::from_toml_str("cluster_size = 0").is_err());
        assert!(ExperimentConfig::from_toml_str("[simulation]\ndt = -1.0").is_err());
        assert!(ExperimentConfig::from_toml_str("[cues]\nRPEN_input = [[0.2, 0.1]]").is_err());
        assert!(ExperimentConfig::from_toml_str("cluster_size = \"ten\"").is_err());
    }

    #[test]
    fn test_neuron_overrides() {
        let mut neurons = NeuronsConfig::default();
        neurons.overrides.insert("EIP".into(), NeuronParams::reip());
        neurons.overrides.insert(
            "EIP3".into(),
            NeuronParams {
                threshold: -45.0,
                ..NeuronParams::default()
            },
        );
        assert_eq!(neurons.params_for("EIP0"), NeuronParams::reip());
        assert_eq!(neurons.params_for("EIP3").threshold, -45.0);
        assert_eq!(neurons.params_for("PEN0"), NeuronParams::default());
        assert_eq!(population_kind("PEN12"), "PEN");
        assert_eq!(population_kind("REIP"), "REIP");
    }

    #[test]
    fn test_receptor_specs() {
        let receptors = Receptors::default();
        assert_eq!(receptors.spec(Receptor::Nmda, 6.0), SynapseSpec::nmda(6.0));
        assert_eq!(receptors.spec(Receptor::Gabaa, 5.0), SynapseSpec::gabaa(5.0));
        assert_eq!(receptors.spec(Receptor::Acetylcholine, 2.1), SynapseSpec::acetylcholine(2.1));
    }
}
