//! Leaky integrate-and-fire neuron clusters

use crate::{
    error::*,
    synapse::{SynapseCluster, SynapseId},
};
use ndarray::{Array1, ArrayView1, Zip};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Electrical parameters shared by every unit of a cluster
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronParams {
    /// Membrane capacitance (nF)
    pub cm: f64,
    /// Leak conductance (nS)
    pub gl: f64,
    /// Leak and reset potential (mV)
    pub vl: f64,
    /// Firing threshold (mV)
    pub threshold: f64,
}

impl Default for NeuronParams {
    fn default() -> Self {
        Self {
            cm: 0.1,
            gl: 0.1 / 15e-3,
            vl: -70.0,
            threshold: -50.0,
        }
    }
}

impl NeuronParams {
    /// Parameters of the ring (REIP) inhibitory neurons: smaller and faster
    pub fn reip() -> Self {
        Self {
            cm: 0.01,
            gl: 0.01 / 15e-3,
            ..Self::default()
        }
    }

    /// Membrane time constant `cm / gl` (s)
    pub fn time_constant(&self) -> f64 {
        self.cm / self.gl
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.cm > 0.0) {
            return Err(RuntimeError::invalid_parameter("cm", self.cm.to_string(), "> 0.0"));
        }
        if !(self.gl > 0.0) {
            return Err(RuntimeError::invalid_parameter("gl", self.gl.to_string(), "> 0.0"));
        }
        if !(self.threshold > self.vl) {
            return Err(RuntimeError::invalid_parameter(
                "threshold",
                format!("{} (with vl={})", self.threshold, self.vl),
                "> vl",
            ));
        }
        Ok(())
    }
}

/// Seeded Gaussian current noise
#[derive(Debug, Clone)]
struct NoiseSource {
    sd: f64,
    seed: u64,
    rng: StdRng,
}

impl NoiseSource {
    fn new(sd: f64, seed: u64) -> Self {
        Self {
            sd,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    // Box-Muller
    fn sample(&mut self) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen();
        self.sd * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// A population of identical point neurons integrated with forward Euler
#[derive(Debug, Clone)]
pub struct NeuronCluster {
    name: String,
    size: usize,
    params: NeuronParams,
    voltage: Array1<f64>,
    pending: Array1<f64>,
    firing: Array1<bool>,
    drive: Array1<f64>,
    bias_current: f64,
    noise: Option<NoiseSource>,
    pub(crate) inputs: Vec<SynapseId>,
    pub(crate) outputs: Vec<SynapseId>,
    firing_time_indices: Vec<u64>,
}

impl NeuronCluster {
    /// Create a new cluster of `size` units at rest
    pub fn new(name: impl Into<String>, size: usize, params: NeuronParams) -> Result<Self> {
        params.validate()?;
        if size == 0 {
            return Err(RuntimeError::invalid_parameter("size", "0", "> 0"));
        }
        Ok(Self {
            name: name.into(),
            size,
            params,
            voltage: Array1::from_elem(size, params.vl),
            pending: Array1::from_elem(size, params.vl),
            firing: Array1::from_elem(size, false),
            drive: Array1::zeros(size),
            bias_current: 0.0,
            noise: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            firing_time_indices: Vec::new(),
        })
    }

    /// Add seeded Gaussian noise with standard deviation `sd` (pA) to the input current
    pub fn with_noise(mut self, sd: f64, seed: u64) -> Result<Self> {
        self.set_noise(sd, seed)?;
        Ok(self)
    }

    /// Enable seeded Gaussian current noise
    pub fn set_noise(&mut self, sd: f64, seed: u64) -> Result<()> {
        if !(sd >= 0.0) {
            return Err(RuntimeError::invalid_parameter("noise sd", sd.to_string(), ">= 0.0"));
        }
        self.noise = Some(NoiseSource::new(sd, seed));
        Ok(())
    }

    /// Cluster name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of units
    pub fn size(&self) -> usize {
        self.size
    }

    /// Electrical parameters
    pub fn params(&self) -> &NeuronParams {
        &self.params
    }

    /// Committed membrane voltages (mV)
    pub fn voltage(&self) -> ArrayView1<'_, f64> {
        self.voltage.view()
    }

    /// Average committed voltage (mV)
    pub fn mean_voltage(&self) -> f64 {
        self.voltage.mean().unwrap_or(self.params.vl)
    }

    /// Firing flags from the most recent compute phase
    pub fn firing(&self) -> ArrayView1<'_, bool> {
        self.firing.view()
    }

    /// Constant current added to every unit's input (pA). Negative values depolarize.
    pub fn bias_current(&self) -> f64 {
        self.bias_current
    }

    /// Set the constant bias current
    pub fn set_bias_current(&mut self, current: f64) {
        self.bias_current = current;
    }

    /// Input synapses, in wiring order
    pub fn inputs(&self) -> &[SynapseId] {
        &self.inputs
    }

    /// Output synapses, in wiring order
    pub fn outputs(&self) -> &[SynapseId] {
        &self.outputs
    }

    /// Step indices at which any unit fired since the last reset
    pub fn firing_time_indices(&self) -> &[u64] {
        &self.firing_time_indices
    }

    /// Return to rest and zero every output synapse
    pub fn reset(&mut self, synapses: &mut [SynapseCluster]) -> Result<()> {
        self.voltage.fill(self.params.vl);
        self.pending.fill(self.params.vl);
        self.firing.fill(false);
        self.firing_time_indices.clear();
        if let Some(noise) = self.noise.as_mut() {
            noise.reseed();
        }
        for id in &self.outputs {
            synapses[id.index()].reset()?;
        }
        Ok(())
    }

    /// Compute phase: integrate one Euler step into the pending buffer, then
    /// let output synapses compute their pending gating from the new firing flags.
    pub fn compute_update(&mut self, time_index: u64, dt: f64, synapses: &mut [SynapseCluster]) {
        self.drive.fill(self.bias_current);
        if let Some(noise) = self.noise.as_mut() {
            self.drive.mapv_inplace(|i| i + noise.sample());
        }
        for id in &self.inputs {
            synapses[id.index()].add_current_into(self.voltage.view(), &mut self.drive);
        }

        let p = self.params;
        Zip::from(&mut self.pending)
            .and(&mut self.firing)
            .and(&self.voltage)
            .and(&self.drive)
            .for_each(|next, fired, &v, &current| {
                let candidate = v + dt * (-p.gl * (v - p.vl) - current) / p.cm;
                *fired = candidate >= p.threshold;
                *next = if *fired { p.vl } else { candidate };
            });

        if self.firing.iter().any(|&fired| fired) {
            self.firing_time_indices.push(time_index);
        }

        for id in &self.outputs {
            synapses[id.index()].compute_update(dt, self.firing.view());
        }
    }

    /// Commit phase: adopt the pending voltage and commit output synapses
    pub fn store_update(&mut self, synapses: &mut [SynapseCluster]) {
        std::mem::swap(&mut self.voltage, &mut self.pending);
        for id in &self.outputs {
            synapses[id.index()].store_update();
        }
    }
}
