//! Heading-direction circuit builder
//!
//! Populations:
//! * `EIP0..`, `PEI0..`, `PEN0..`: one cluster per unit of the bridge tables
//! * `REIP`, `RPEN`, `RPEI`: ring neurons
//! * `EB-R8_input .. EB-L8_input`: visual landmark inputs, one per EB tile
//! * `rot_CW`, `rot_CCW`: rotation inputs to the two PEN hemispheres
//! * `RPEN_input`, `RPEI_input`: ring-neuron drive

use crate::{
    config::{ExperimentConfig, InputSpec, Receptor},
    error::*,
    overlap::{connect_pathway, BuildReport, Pathway},
    table::{Atlas, DENDRITIC},
};
use compass_runtime::{InputNeuronCluster, Network, NeuronCluster};

/// Ring inhibitory neuron of the EIP population
pub const REIP: &str = "REIP";
/// Ring neuron inhibiting the PEN population
pub const RPEN: &str = "RPEN";
/// Ring neuron inhibiting the PEI population
pub const RPEI: &str = "RPEI";
/// Clockwise rotation input
pub const ROT_CW: &str = "rot_CW";
/// Counter-clockwise rotation input
pub const ROT_CCW: &str = "rot_CCW";
/// Drive of [`RPEN`]
pub const RPEN_INPUT: &str = "RPEN_input";
/// Drive of [`RPEI`]
pub const RPEI_INPUT: &str = "RPEI_input";

/// Name of the visual input of an ellipsoid body tile (`EB-L1C` -> `EB-L1_input`)
pub fn visual_input_name(tile: &str) -> String {
    let region = tile
        .strip_suffix('C')
        .or_else(|| tile.strip_suffix('P'))
        .unwrap_or(tile);
    format!("{}_input", region)
}

fn units(atlas: &Atlas, table: &str) -> Result<Vec<String>> {
    Ok(atlas.get(table)?.rows().to_vec())
}

/// Build the heading-direction network described by `config` over the
/// region and pathway tables of `atlas`.
///
/// Fails on missing tables, units or conductance factors, and on cues naming
/// an unknown input. Zero-overlap pairs are not failures; they are listed in
/// the returned report.
pub fn build_heading_network(config: &ExperimentConfig, atlas: &Atlas) -> Result<(Network, BuildReport)> {
    config.validate()?;
    let mut net = Network::new(config.sim_params()?)?;
    let mut report = BuildReport::default();
    let size = config.cluster_size;
    let factors = &config.conductance_factors;
    let receptors = &config.receptors;

    let eips = units(atlas, "EIP_PB")?;
    let peis = units(atlas, "PEI_PB")?;
    let pens = units(atlas, "PEN_PB")?;
    let tiles = atlas.get("EIP_EBC")?.columns().to_vec();

    // neurons
    let noise_seed = config.simulation.seed.unwrap_or(0);
    let names = eips
        .iter()
        .chain(&peis)
        .chain(&pens)
        .map(String::as_str)
        .chain([REIP, RPEN, RPEI]);
    for (i, name) in names.enumerate() {
        let mut cluster = NeuronCluster::new(name, size, config.neurons.params_for(name))?;
        if config.simulation.noise_sd > 0.0 {
            cluster.set_noise(config.simulation.noise_sd, noise_seed.wrapping_add(i as u64))?;
        }
        net.add_neuron(cluster)?;
    }

    // inputs
    let inputs = &config.inputs;
    let mut add_input = |name: &str, role: InputSpec| -> Result<()> {
        let spec = inputs.resolve(name, role);
        net.add_neuron(InputNeuronCluster::new(name, spec.size.unwrap_or(size), spec.frequency)?)?;
        Ok(())
    };
    for tile in &tiles {
        add_input(&visual_input_name(tile), inputs.visual)?;
    }
    add_input(ROT_CW, inputs.rotation)?;
    add_input(ROT_CCW, inputs.rotation)?;
    add_input(RPEN_INPUT, inputs.ring)?;
    add_input(RPEI_INPUT, inputs.ring)?;

    // bridge and ring projections
    for pathway in Pathway::heading_circuit() {
        connect_pathway(
            &mut net,
            &pathway,
            atlas,
            factors,
            &config.overrides,
            receptors,
            &mut report,
        )?;
    }

    // ring inhibition
    let to_ring = receptors.spec(Receptor::Nmda, factors.require("EIP", REIP)?);
    let from_ring = receptors.spec(Receptor::Gabaa, factors.require(REIP, "EIP")?);
    for eip in &eips {
        net.add_synapse(eip, REIP, to_ring)?;
        net.add_synapse(REIP, eip, from_ring)?;
    }
    net.add_synapse(REIP, REIP, receptors.spec(Receptor::Gabaa, factors.require(REIP, REIP)?))?;

    let rpei = receptors.spec(Receptor::Gabaa, factors.require(RPEI, "PEI")?);
    for pei in &peis {
        net.add_synapse(RPEI, pei, rpei)?;
    }
    let rpen = receptors.spec(Receptor::Gabaa, factors.require(RPEN, "PEN")?);
    for pen in &pens {
        net.add_synapse(RPEN, pen, rpen)?;
    }

    // visual landmarks excite the EIPs whose dendrites cover the tile
    let eip_ebc = atlas.get("EIP_EBC")?;
    let visual = receptors.spec(Receptor::Acetylcholine, factors.require("EB_input", "EIP")?);
    for tile in &tiles {
        let input = visual_input_name(tile);
        for eip in eip_ebc.rows_where(tile, DENDRITIC)? {
            net.add_synapse(&input, eip, visual)?;
        }
    }

    net.add_synapse(
        RPEN_INPUT,
        RPEN,
        receptors.spec(Receptor::Acetylcholine, factors.require(RPEN_INPUT, RPEN)?),
    )?;
    net.add_synapse(
        RPEI_INPUT,
        RPEI,
        receptors.spec(Receptor::Acetylcholine, factors.require(RPEI_INPUT, RPEI)?),
    )?;

    // each rotation direction drives one hemisphere of the PEN population
    let rotation = receptors.spec(Receptor::Acetylcholine, factors.require("rot", "PEN")?);
    let (right, left) = pens.split_at(pens.len() / 2);
    for pen in right {
        net.add_synapse(ROT_CW, pen, rotation)?;
    }
    for pen in left {
        net.add_synapse(ROT_CCW, pen, rotation)?;
    }

    for (name, intervals) in &config.cues {
        let input = net.input_mut(name)?;
        input.set_intervals(intervals.iter().copied());
        input.validate_intervals()?;
    }

    log::info!(
        "Built heading network: {} clusters, {} synapse clusters, {} connections, {} data warnings",
        net.cluster_count(),
        net.synapse_count(),
        net.connection_count(),
        report.warnings.len()
    );
    Ok((net, report))
}
