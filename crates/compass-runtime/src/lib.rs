//! Cluster-level spiking simulation engine for the heading-direction circuit
//!
//! Populations of leaky integrate-and-fire neurons exchange current through
//! synapse clusters. Every step runs in two phases: all clusters compute
//! their next state from committed state, then all clusters commit. No
//! cluster or synapse ever observes a value computed in the same step.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export the archive type produced by `SimulationResult::to_archive`
pub use compass_storage::SpikeArchive;

// Core modules
pub mod cluster;
pub mod error;
pub mod input;
pub mod network;
pub mod neuron;
pub mod simulation;
pub mod synapse;

// Re-export essential types
pub use cluster::Cluster;
pub use error::{ErrorKind, Result, RuntimeError};
pub use input::{spike_schedule, InputNeuronCluster};
pub use network::{Network, NetworkBuilder, SimParams};
pub use neuron::{NeuronCluster, NeuronParams};
pub use simulation::{
    run_fixed, PerfReport, Probe, RecordingParams, SimulationEngine, SimulationResult, Trace,
    DEFAULT_RATE_DECAY,
};
pub use synapse::{NmdaParams, SynapseCluster, SynapseId, SynapseKind, SynapseSpec};

/// Default simulation time step (s)
pub const DEFAULT_TIMESTEP: f64 = 1e-3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        let params = NeuronParams::default();
        assert!(params.cm > 0.0);

        let spec = SynapseSpec::nmda(1.0);
        assert_eq!(spec.kind.label(), "nmda");

        let sim = SimParams::default();
        assert_eq!(sim.dt, DEFAULT_TIMESTEP);
    }
}
