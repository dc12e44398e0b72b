//! Network container: named clusters, a shared synapse arena and the
//! two-phase step

use crate::{
    cluster::Cluster,
    error::*,
    input::InputNeuronCluster,
    neuron::NeuronCluster,
    synapse::{SynapseCluster, SynapseId, SynapseSpec},
};
use ndarray::Array1;
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed-step timing of a simulation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimParams {
    /// Simulation time of step 0 (s)
    pub start_time: f64,
    /// Step size (s)
    pub dt: f64,
    /// Number of steps in a full run
    pub num_steps: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            dt: 1e-3,
            num_steps: 1000,
        }
    }
}

impl SimParams {
    /// Create new timing parameters
    pub fn new(start_time: f64, dt: f64, num_steps: u64) -> Result<Self> {
        let params = Self {
            start_time,
            dt,
            num_steps,
        };
        params.validate()?;
        Ok(params)
    }

    /// Timing covering `[start_time, end_time)` at step `dt`
    pub fn from_window(start_time: f64, end_time: f64, dt: f64) -> Result<Self> {
        if !(end_time >= start_time) {
            return Err(RuntimeError::invalid_parameter(
                "end_time",
                end_time.to_string(),
                format!(">= start_time ({})", start_time),
            ));
        }
        let mut params = Self::new(start_time, dt, 0)?;
        params.num_steps = ((end_time - start_time) / dt).round() as u64;
        Ok(params)
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(RuntimeError::invalid_parameter("dt", self.dt.to_string(), "finite and > 0.0"));
        }
        if !self.start_time.is_finite() {
            return Err(RuntimeError::invalid_parameter(
                "start_time",
                self.start_time.to_string(),
                "finite",
            ));
        }
        Ok(())
    }

    /// Simulation time at step `index`
    pub fn time_at(&self, index: u64) -> f64 {
        self.start_time + index as f64 * self.dt
    }

    /// Simulation time of every step in a full run
    pub fn time_axis(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.num_steps as usize, |i| self.time_at(i as u64))
    }

    /// Simulated duration of a full run (s)
    pub fn duration(&self) -> f64 {
        self.num_steps as f64 * self.dt
    }
}

#[derive(Debug, Clone, Copy)]
struct Connection {
    pre: usize,
    post: usize,
    synapse: SynapseId,
}

/// A named set of clusters connected by synapse clusters.
///
/// Synapse clusters live in one arena owned by the network and clusters
/// refer to them by [`SynapseId`]. A presynaptic cluster that drives several
/// targets through equal synapse specs owns a single shared gating state.
#[derive(Debug, Clone)]
pub struct Network {
    params: SimParams,
    clusters: Vec<Cluster>,
    cluster_index: HashMap<String, usize>,
    synapses: Vec<SynapseCluster>,
    connections: Vec<Connection>,
    connection_index: HashMap<(usize, usize), usize>,
    time: f64,
    time_index: u64,
    is_reset: bool,
}

impl Network {
    /// Create an empty network
    pub fn new(params: SimParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            clusters: Vec::new(),
            cluster_index: HashMap::new(),
            synapses: Vec::new(),
            connections: Vec::new(),
            connection_index: HashMap::new(),
            time: params.start_time,
            time_index: 0,
            is_reset: false,
        })
    }

    /// Timing parameters
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Replace the timing parameters; takes effect at the next reset
    pub fn set_params(&mut self, params: SimParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.is_reset = false;
        Ok(())
    }

    /// Register one cluster under its name
    pub fn add_neuron(&mut self, cluster: impl Into<Cluster>) -> Result<()> {
        let cluster = cluster.into();
        if self.cluster_index.contains_key(cluster.name()) {
            return Err(RuntimeError::DuplicateCluster {
                name: cluster.name().to_string(),
            });
        }
        self.cluster_index.insert(cluster.name().to_string(), self.clusters.len());
        self.clusters.push(cluster);
        self.is_reset = false;
        Ok(())
    }

    /// Register several clusters, stopping at the first duplicate name
    pub fn add_neurons<I, C>(&mut self, clusters: I) -> Result<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<Cluster>,
    {
        for cluster in clusters {
            self.add_neuron(cluster)?;
        }
        Ok(())
    }

    /// Connect `pre` to `post` with a synapse described by `spec`.
    ///
    /// If `pre` already has an output synapse with an equal spec, that
    /// synapse is shared with `post` instead of allocating a new one.
    pub fn add_synapse(&mut self, pre: &str, post: &str, spec: SynapseSpec) -> Result<SynapseId> {
        spec.validate()?;
        let pre_idx = self.index_of(pre)?;
        let post_idx = self.index_of(post)?;

        if self.clusters[post_idx].is_input() {
            return Err(RuntimeError::WrongClusterKind {
                name: post.to_string(),
                expected: "a neuron cluster",
            });
        }
        if self.connection_index.contains_key(&(pre_idx, post_idx)) {
            return Err(RuntimeError::DuplicateSynapse {
                pre: pre.to_string(),
                post: post.to_string(),
            });
        }

        let shared = self.clusters[pre_idx]
            .outputs()
            .iter()
            .copied()
            .find(|id| self.synapses[id.index()].spec() == &spec);

        let id = match shared {
            Some(id) => {
                log::debug!("{} -> {} shares synapse {} ({})", pre, post, id.raw(), spec.kind.label());
                id
            }
            None => {
                let raw = u32::try_from(self.synapses.len())
                    .map_err(|_| RuntimeError::invalid_config("synapse arena is full"))?;
                let id = SynapseId::new(raw);
                let mut synapse = SynapseCluster::new(spec);
                synapse.wire(self.clusters[pre_idx].size());
                self.synapses.push(synapse);
                self.clusters[pre_idx].push_output(id);
                id
            }
        };
        self.clusters[post_idx].push_input(id)?;

        self.connection_index.insert((pre_idx, post_idx), self.connections.len());
        self.connections.push(Connection {
            pre: pre_idx,
            post: post_idx,
            synapse: id,
        });
        self.is_reset = false;
        Ok(id)
    }

    /// Return to `start_time`, step 0, and reset every cluster and synapse
    pub fn reset(&mut self) -> Result<()> {
        let SimParams {
            start_time,
            dt,
            num_steps,
        } = self.params;
        for cluster in &mut self.clusters {
            if let Cluster::Input(input) = cluster {
                input.set_sim_params(start_time, dt, num_steps);
            }
            cluster.reset(&mut self.synapses)?;
        }
        self.time = start_time;
        self.time_index = 0;
        self.is_reset = true;
        log::debug!(
            "Network reset: {} clusters, {} synapses, start {}s, dt {}s",
            self.clusters.len(),
            self.synapses.len(),
            start_time,
            dt
        );
        Ok(())
    }

    /// Advance one step: every cluster computes from committed state, then every cluster commits
    pub fn update(&mut self) -> Result<()> {
        if !self.is_reset {
            return Err(RuntimeError::NotReset);
        }
        let dt = self.params.dt;
        for cluster in &mut self.clusters {
            cluster.compute_update(self.time_index, dt, &mut self.synapses);
        }
        for cluster in &mut self.clusters {
            cluster.store_update(&mut self.synapses);
        }
        self.time_index += 1;
        self.time = self.params.time_at(self.time_index);
        Ok(())
    }

    /// Current simulation time (s)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Index of the next step to compute
    pub fn time_index(&self) -> u64 {
        self.time_index
    }

    /// Whether the network has been reset since its last topology change
    pub fn is_reset(&self) -> bool {
        self.is_reset
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.cluster_index
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::cluster_not_found(name))
    }

    /// Look up a cluster by name
    pub fn cluster(&self, name: &str) -> Result<&Cluster> {
        Ok(&self.clusters[self.index_of(name)?])
    }

    /// Look up a cluster by name, mutably. The network must be reset again
    /// before the next update.
    pub fn cluster_mut(&mut self, name: &str) -> Result<&mut Cluster> {
        let idx = self.index_of(name)?;
        self.is_reset = false;
        Ok(&mut self.clusters[idx])
    }

    /// Look up a leaky integrate-and-fire cluster
    pub fn neuron(&self, name: &str) -> Result<&NeuronCluster> {
        self.cluster(name)?.as_neuron().ok_or_else(|| RuntimeError::WrongClusterKind {
            name: name.to_string(),
            expected: "a neuron cluster",
        })
    }

    /// Look up a leaky integrate-and-fire cluster, mutably. Bias and noise
    /// changes apply from the next step, no reset needed.
    pub fn neuron_mut(&mut self, name: &str) -> Result<&mut NeuronCluster> {
        let idx = self.index_of(name)?;
        self.clusters[idx]
            .as_neuron_mut()
            .ok_or_else(|| RuntimeError::WrongClusterKind {
                name: name.to_string(),
                expected: "a neuron cluster",
            })
    }

    /// Look up an input cluster
    pub fn input(&self, name: &str) -> Result<&InputNeuronCluster> {
        self.cluster(name)?.as_input().ok_or_else(|| RuntimeError::WrongClusterKind {
            name: name.to_string(),
            expected: "an input cluster",
        })
    }

    /// Look up an input cluster, mutably. Interval changes take effect at the next reset.
    pub fn input_mut(&mut self, name: &str) -> Result<&mut InputNeuronCluster> {
        self.cluster_mut(name)?
            .as_input_mut()
            .ok_or_else(|| RuntimeError::WrongClusterKind {
                name: name.to_string(),
                expected: "an input cluster",
            })
    }

    /// Arena id of the synapse connecting `pre` to `post`
    pub fn synapse_id(&self, pre: &str, post: &str) -> Result<SynapseId> {
        let key = (self.index_of(pre)?, self.index_of(post)?);
        self.connection_index
            .get(&key)
            .map(|&c| self.connections[c].synapse)
            .ok_or_else(|| RuntimeError::synapse_not_found(pre, post))
    }

    /// Synapse connecting `pre` to `post`
    pub fn synapse(&self, pre: &str, post: &str) -> Result<&SynapseCluster> {
        let id = self.synapse_id(pre, post)?;
        Ok(&self.synapses[id.index()])
    }

    /// Synapse connecting `pre` to `post`, mutably. Shared synapses are
    /// reachable through every pair that uses them.
    pub fn synapse_mut(&mut self, pre: &str, post: &str) -> Result<&mut SynapseCluster> {
        let id = self.synapse_id(pre, post)?;
        Ok(&mut self.synapses[id.index()])
    }

    /// Every cluster, in registration order
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Every cluster name, in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.clusters.iter().map(|c| c.name())
    }

    /// Every `(pre, post, synapse)` connection, in wiring order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, SynapseId)> {
        self.connections.iter().map(|c| {
            (
                self.clusters[c.pre].name(),
                self.clusters[c.post].name(),
                c.synapse,
            )
        })
    }

    /// Number of registered clusters
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Number of distinct synapse clusters after sharing
    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Number of connected (pre, post) pairs
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Multi-line listing of every cluster with its inputs and outputs
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (idx, cluster) in self.clusters.iter().enumerate() {
            let inputs: Vec<String> = self
                .connections
                .iter()
                .filter(|c| c.post == idx)
                .map(|c| self.describe(c, self.clusters[c.pre].name()))
                .collect();
            let outputs: Vec<String> = self
                .connections
                .iter()
                .filter(|c| c.pre == idx)
                .map(|c| self.describe(c, self.clusters[c.post].name()))
                .collect();
            out.push_str(&format!(
                "{} ({}, {} units)\n  inputs:  [{}]\n  outputs: [{}]\n",
                cluster.name(),
                cluster.kind_label(),
                cluster.size(),
                inputs.join(", "),
                outputs.join(", ")
            ));
        }
        out
    }

    fn describe(&self, connection: &Connection, peer: &str) -> String {
        let spec = self.synapses[connection.synapse.index()].spec();
        format!("{} {} g={}", peer, spec.kind.label(), spec.max_conductance)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Network: {} clusters, {} connections, {} synapses, dt={}s, {} steps",
            self.cluster_count(),
            self.connection_count(),
            self.synapse_count(),
            self.params.dt,
            self.params.num_steps
        )
    }
}

/// Builder for constructing networks
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    params: SimParams,
    clusters: Vec<Cluster>,
    synapses: Vec<(String, String, SynapseSpec)>,
}

impl NetworkBuilder {
    /// Create a new network builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timing parameters
    pub fn with_params(mut self, params: SimParams) -> Self {
        self.params = params;
        self
    }

    /// Add a cluster
    pub fn add_neuron(mut self, cluster: impl Into<Cluster>) -> Self {
        self.clusters.push(cluster.into());
        self
    }

    /// Add a synapse
    pub fn add_synapse(mut self, pre: impl Into<String>, post: impl Into<String>, spec: SynapseSpec) -> Self {
        self.synapses.push((pre.into(), post.into(), spec));
        self
    }

    /// Connect the listed clusters in a closed loop, each to the next
    pub fn ring(mut self, names: &[&str], spec: SynapseSpec) -> Self {
        for (i, pre) in names.iter().enumerate() {
            let post = names[(i + 1) % names.len()];
            self.synapses.push((pre.to_string(), post.to_string(), spec));
        }
        self
    }

    /// Build the network
    pub fn build(self) -> Result<Network> {
        let mut network = Network::new(self.params)?;
        network.add_neurons(self.clusters)?;
        for (pre, post, spec) in &self.synapses {
            network.add_synapse(pre, post, *spec)?;
        }
        Ok(network)
    }
}
