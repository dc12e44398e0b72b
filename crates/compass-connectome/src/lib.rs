//! Anatomical connectivity for the compass heading-direction circuit
//!
//! Region tables record where each unit arborizes in the protocerebral
//! bridge and the ellipsoid body; the number of columns where one unit's
//! axons meet another unit's dendrites sets the strength of the synapse
//! between them. This crate turns those tables, plus an
//! [`ExperimentConfig`], into a ready-to-run [`compass_runtime::Network`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod atlas;
pub mod builder;
pub mod config;
pub mod error;
pub mod overlap;
pub mod table;

pub use builder::{build_heading_network, visual_input_name};
pub use config::{
    population_kind, ExperimentConfig, InputSpec, InputsConfig, NeuronsConfig, Receptor, ReceptorParams,
    Receptors, SimulationConfig, DEFAULT_CLUSTER_SIZE,
};
pub use error::{ConnectomeError, Result};
pub use overlap::{
    connect_pathway, overlap_count, AppliedOverride, BuildReport, ConductanceFactors, DataWarning,
    OverlapOverride, OverlapOverrides, Pathway,
};
pub use table::{unit_labels, Atlas, OverlapTable, AXONAL, DENDRITIC};
