//! Synapse clusters: gating dynamics between a presynaptic and a postsynaptic cluster
//!
//! A synapse cluster keeps one gating value per presynaptic unit. Gating is
//! driven only by presynaptic firing, so every column of the conceptual
//! `[pre × post]` gating matrix is identical and the cluster can be shared by
//! several postsynaptic clusters without cloning state.

use crate::error::*;
use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Saturating gating increment of NMDA receptors on a presynaptic spike
pub const NMDA_ALPHA: f64 = 0.63;

/// Magnesium-block coefficient. Lower than the literature value of 1.0;
/// the circuit is tuned against this one.
pub const NMDA_MG_BLOCK: f64 = 0.1;

/// GABA-A decay time constant (s)
pub const GABAA_TIME_CONSTANT: f64 = 0.005;
/// GABA-A reversal potential (mV)
pub const GABAA_REVERSAL_POTENTIAL: f64 = -70.0;
/// Acetylcholine decay time constant (s)
pub const ACETYLCHOLINE_TIME_CONSTANT: f64 = 0.020;
/// Acetylcholine reversal potential (mV)
pub const ACETYLCHOLINE_REVERSAL_POTENTIAL: f64 = 0.0;
/// NMDA decay time constant (s)
pub const NMDA_TIME_CONSTANT: f64 = 0.100;
/// NMDA reversal potential (mV)
pub const NMDA_REVERSAL_POTENTIAL: f64 = 0.0;

/// Index of a synapse cluster in the network's synapse arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SynapseId(pub u32);

impl SynapseId {
    /// Create a new synapse ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Position in the arena
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// NMDA-specific constants
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NmdaParams {
    /// Fraction of the remaining closed channels opened by one spike
    pub alpha: f64,
    /// Magnesium-block coefficient
    pub mg_block: f64,
}

impl Default for NmdaParams {
    fn default() -> Self {
        Self {
            alpha: NMDA_ALPHA,
            mg_block: NMDA_MG_BLOCK,
        }
    }
}

/// Receptor kind of a synapse cluster
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SynapseKind {
    /// Linear conductance, unit gating jump per spike
    Standard,
    /// Voltage-gated conductance, saturating gating jump per spike
    Nmda(NmdaParams),
}

impl SynapseKind {
    /// NMDA kind with the default constants
    pub fn nmda() -> Self {
        Self::Nmda(NmdaParams::default())
    }

    /// Short label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Nmda(_) => "nmda",
        }
    }
}

/// Construction-time description of a synapse cluster.
///
/// Two specs compare equal when they have the same kind (including the kind's
/// constants) and identical scalar parameters; the network uses this to share
/// one synapse cluster among postsynaptic targets of the same presynaptic
/// cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseSpec {
    /// Receptor kind
    pub kind: SynapseKind,
    /// Gating decay time constant (s)
    pub time_constant: f64,
    /// Maximum conductance (nS)
    pub max_conductance: f64,
    /// Reversal potential (mV)
    pub reversal_potential: f64,
}

impl SynapseSpec {
    /// Create a new synapse spec
    pub fn new(
        kind: SynapseKind,
        time_constant: f64,
        max_conductance: f64,
        reversal_potential: f64,
    ) -> Self {
        Self {
            kind,
            time_constant,
            max_conductance,
            reversal_potential,
        }
    }

    /// Inhibitory GABA-A synapse
    pub fn gabaa(max_conductance: f64) -> Self {
        Self::new(
            SynapseKind::Standard,
            GABAA_TIME_CONSTANT,
            max_conductance,
            GABAA_REVERSAL_POTENTIAL,
        )
    }

    /// Excitatory acetylcholine synapse
    pub fn acetylcholine(max_conductance: f64) -> Self {
        Self::new(
            SynapseKind::Standard,
            ACETYLCHOLINE_TIME_CONSTANT,
            max_conductance,
            ACETYLCHOLINE_REVERSAL_POTENTIAL,
        )
    }

    /// Excitatory NMDA synapse
    pub fn nmda(max_conductance: f64) -> Self {
        Self::new(
            SynapseKind::nmda(),
            NMDA_TIME_CONSTANT,
            max_conductance,
            NMDA_REVERSAL_POTENTIAL,
        )
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.time_constant > 0.0) {
            return Err(RuntimeError::invalid_parameter(
                "time_constant",
                self.time_constant.to_string(),
                "> 0.0",
            ));
        }
        if !self.max_conductance.is_finite() {
            return Err(RuntimeError::invalid_parameter(
                "max_conductance",
                self.max_conductance.to_string(),
                "finite",
            ));
        }
        if !self.reversal_potential.is_finite() {
            return Err(RuntimeError::invalid_parameter(
                "reversal_potential",
                self.reversal_potential.to_string(),
                "finite",
            ));
        }
        if let SynapseKind::Nmda(params) = self.kind {
            if !(0.0..=1.0).contains(&params.alpha) {
                return Err(RuntimeError::invalid_parameter(
                    "alpha",
                    params.alpha.to_string(),
                    "in [0, 1]",
                ));
            }
        }
        Ok(())
    }
}

/// Synaptic gating state between two clusters
#[derive(Debug, Clone)]
pub struct SynapseCluster {
    spec: SynapseSpec,
    pre_size: Option<usize>,
    gating: Array1<f64>,
    pending: Array1<f64>,
}

impl SynapseCluster {
    /// Create an unwired synapse cluster
    pub fn new(spec: SynapseSpec) -> Self {
        Self {
            spec,
            pre_size: None,
            gating: Array1::zeros(0),
            pending: Array1::zeros(0),
        }
    }

    /// Attach to a presynaptic cluster of `pre_size` units
    pub fn wire(&mut self, pre_size: usize) {
        self.pre_size = Some(pre_size);
        self.gating = Array1::zeros(pre_size);
        self.pending = Array1::zeros(pre_size);
    }

    /// Construction-time parameters
    pub fn spec(&self) -> &SynapseSpec {
        &self.spec
    }

    /// Receptor kind
    pub fn kind(&self) -> SynapseKind {
        self.spec.kind
    }

    /// Maximum conductance (nS)
    pub fn max_conductance(&self) -> f64 {
        self.spec.max_conductance
    }

    /// Presynaptic population size, once wired
    pub fn pre_size(&self) -> Option<usize> {
        self.pre_size
    }

    /// Committed gating, one value per presynaptic unit
    pub fn gating(&self) -> ArrayView1<'_, f64> {
        self.gating.view()
    }

    /// Mutable access to the committed gating
    pub fn gating_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.gating.view_mut()
    }

    /// Average committed gating over presynaptic units
    pub fn mean_gating(&self) -> f64 {
        self.gating.mean().unwrap_or(0.0)
    }

    /// Accumulate the current this synapse drives into each postsynaptic unit
    /// at membrane voltage `voltage`. Reads committed gating only.
    pub fn add_current_into(&self, voltage: ArrayView1<'_, f64>, out: &mut Array1<f64>) {
        let e_rev = self.spec.reversal_potential;
        match self.spec.kind {
            SynapseKind::Standard => {
                let conductance = self.spec.max_conductance * self.gating.sum();
                Zip::from(out)
                    .and(&voltage)
                    .for_each(|i, &v| *i += conductance * (v - e_rev));
            }
            SynapseKind::Nmda(params) => {
                let g_max = self.spec.max_conductance;
                let s = self.mean_gating();
                Zip::from(out).and(&voltage).for_each(|i, &v| {
                    let conductance = g_max / (1.0 + params.mg_block * (-0.062 * v / 3.57).exp());
                    *i += conductance * s * (v - e_rev);
                });
            }
        }
    }

    /// Current into each postsynaptic unit at membrane voltage `voltage`
    pub fn current(&self, voltage: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut out = Array1::zeros(voltage.len());
        self.add_current_into(voltage, &mut out);
        out
    }

    /// Compute the pending gating from the presynaptic firing vector
    pub fn compute_update(&mut self, dt: f64, firing: ArrayView1<'_, bool>) {
        debug_assert_eq!(firing.len(), self.gating.len());
        let decay = dt / self.spec.time_constant;
        match self.spec.kind {
            SynapseKind::Standard => {
                Zip::from(&mut self.pending)
                    .and(&self.gating)
                    .and(&firing)
                    .for_each(|next, &s, &fired| {
                        *next = s - s * decay;
                        if fired {
                            *next += 1.0;
                        }
                    });
            }
            SynapseKind::Nmda(params) => {
                Zip::from(&mut self.pending)
                    .and(&self.gating)
                    .and(&firing)
                    .for_each(|next, &s, &fired| {
                        *next = s - s * decay;
                        if fired {
                            *next += params.alpha * (1.0 - s);
                        }
                    });
            }
        }
    }

    /// Commit the pending gating
    pub fn store_update(&mut self) {
        std::mem::swap(&mut self.gating, &mut self.pending);
    }

    /// Zero the gating
    pub fn reset(&mut self) -> Result<()> {
        if self.pre_size.is_none() {
            return Err(RuntimeError::UnwiredSynapse);
        }
        self.gating.fill(0.0);
        self.pending.fill(0.0);
        Ok(())
    }
}
