//! Closed set of cluster kinds held by a network

use crate::{
    error::*,
    input::InputNeuronCluster,
    neuron::NeuronCluster,
    synapse::{SynapseCluster, SynapseId},
};
use ndarray::ArrayView1;

/// A neuron population registered in a [`Network`](crate::Network)
#[derive(Debug, Clone)]
pub enum Cluster {
    /// Leaky integrate-and-fire population
    Neuron(NeuronCluster),
    /// Scheduled stimulus population
    Input(InputNeuronCluster),
}

impl From<NeuronCluster> for Cluster {
    fn from(cluster: NeuronCluster) -> Self {
        Self::Neuron(cluster)
    }
}

impl From<InputNeuronCluster> for Cluster {
    fn from(cluster: InputNeuronCluster) -> Self {
        Self::Input(cluster)
    }
}

impl Cluster {
    /// Cluster name
    pub fn name(&self) -> &str {
        match self {
            Self::Neuron(c) => c.name(),
            Self::Input(c) => c.name(),
        }
    }

    /// Number of units
    pub fn size(&self) -> usize {
        match self {
            Self::Neuron(c) => c.size(),
            Self::Input(c) => c.size(),
        }
    }

    /// Firing flags from the most recent compute phase
    pub fn firing(&self) -> ArrayView1<'_, bool> {
        match self {
            Self::Neuron(c) => c.firing(),
            Self::Input(c) => c.firing(),
        }
    }

    /// Input synapses; input clusters have none
    pub fn inputs(&self) -> &[SynapseId] {
        match self {
            Self::Neuron(c) => c.inputs(),
            Self::Input(_) => &[],
        }
    }

    /// Output synapses
    pub fn outputs(&self) -> &[SynapseId] {
        match self {
            Self::Neuron(c) => c.outputs(),
            Self::Input(c) => c.outputs(),
        }
    }

    /// Step indices at which any unit fired since the last reset
    pub fn firing_time_indices(&self) -> &[u64] {
        match self {
            Self::Neuron(c) => c.firing_time_indices(),
            Self::Input(c) => c.firing_time_indices(),
        }
    }

    /// Whether this is a stimulus population
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Short kind label for summaries
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Neuron(_) => "neuron",
            Self::Input(_) => "input",
        }
    }

    /// Borrow as a neuron cluster
    pub fn as_neuron(&self) -> Option<&NeuronCluster> {
        match self {
            Self::Neuron(c) => Some(c),
            Self::Input(_) => None,
        }
    }

    /// Mutably borrow as a neuron cluster
    pub fn as_neuron_mut(&mut self) -> Option<&mut NeuronCluster> {
        match self {
            Self::Neuron(c) => Some(c),
            Self::Input(_) => None,
        }
    }

    /// Borrow as an input cluster
    pub fn as_input(&self) -> Option<&InputNeuronCluster> {
        match self {
            Self::Input(c) => Some(c),
            Self::Neuron(_) => None,
        }
    }

    /// Mutably borrow as an input cluster
    pub fn as_input_mut(&mut self) -> Option<&mut InputNeuronCluster> {
        match self {
            Self::Input(c) => Some(c),
            Self::Neuron(_) => None,
        }
    }

    pub(crate) fn push_output(&mut self, id: SynapseId) {
        match self {
            Self::Neuron(c) => c.outputs.push(id),
            Self::Input(c) => c.outputs.push(id),
        }
    }

    pub(crate) fn push_input(&mut self, id: SynapseId) -> Result<()> {
        match self {
            Self::Neuron(c) => {
                c.inputs.push(id);
                Ok(())
            }
            Self::Input(c) => Err(RuntimeError::WrongClusterKind {
                name: c.name().to_string(),
                expected: "a neuron cluster",
            }),
        }
    }

    /// Return to the initial state, resetting output synapses
    pub fn reset(&mut self, synapses: &mut [SynapseCluster]) -> Result<()> {
        match self {
            Self::Neuron(c) => c.reset(synapses),
            Self::Input(c) => c.reset(synapses),
        }
    }

    /// Compute phase of one step
    pub fn compute_update(&mut self, time_index: u64, dt: f64, synapses: &mut [SynapseCluster]) {
        match self {
            Self::Neuron(c) => c.compute_update(time_index, dt, synapses),
            Self::Input(c) => c.compute_update(time_index, dt, synapses),
        }
    }

    /// Commit phase of one step
    pub fn store_update(&mut self, synapses: &mut [SynapseCluster]) {
        match self {
            Self::Neuron(c) => c.store_update(synapses),
            Self::Input(c) => c.store_update(synapses),
        }
    }
}
