//! Poisson-free input populations that fire on a regular schedule
//!
//! An input cluster fires all of its units together at a fixed frequency
//! while inside one of its activation intervals. The schedule is expanded to
//! step indices when the cluster is reset, so the hot loop only compares the
//! current step against a cursor.

use crate::{
    error::*,
    synapse::{SynapseCluster, SynapseId},
};
use ndarray::{Array1, ArrayView1};

/// Step indices in `0..num_steps` at which an input of frequency `frequency`
/// fires within `intervals`, relative to `start_time`.
///
/// For each interval `(t0, tf)` there are `round(f * (tf - t0))` spikes, the
/// `j`-th mapped to step `round((f * (t0 - start_time) + j) / (f * dt))`.
/// Rounding is half-to-even. Indices outside the run are dropped and
/// repeated indices are collapsed, so the result is strictly increasing and
/// never longer than `num_steps`.
pub fn spike_schedule(
    start_time: f64,
    dt: f64,
    num_steps: u64,
    frequency: f64,
    intervals: &[(f64, f64)],
) -> Vec<u64> {
    let mut indices = Vec::new();
    if !(frequency > 0.0) || !(dt > 0.0) || num_steps == 0 {
        return indices;
    }

    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let step = frequency * dt;
    for (t0, tf) in sorted {
        let count = (frequency * (tf - t0)).round_ties_even();
        if !(count > 0.0) {
            continue;
        }
        let offset = frequency * (t0 - start_time);
        // spikes with offset + j <= -1 land before step 0
        let first = (-offset).floor().max(0.0) as u64;
        for j in first..count as u64 {
            let index = ((offset + j as f64) / step).round_ties_even();
            if index < 0.0 {
                continue;
            }
            if index >= num_steps as f64 {
                break;
            }
            let index = index as u64;
            if indices.last().map_or(true, |&last| index > last) {
                indices.push(index);
            }
        }
    }
    indices
}

/// A population of stimulus units with no membrane dynamics
#[derive(Debug, Clone)]
pub struct InputNeuronCluster {
    name: String,
    size: usize,
    frequency: f64,
    intervals: Vec<(f64, f64)>,
    sim_params: Option<(f64, f64, u64)>,
    schedule: Vec<u64>,
    cursor: usize,
    firing: Array1<bool>,
    pub(crate) outputs: Vec<SynapseId>,
    firing_time_indices: Vec<u64>,
}

impl InputNeuronCluster {
    /// Create an input cluster firing at `frequency` (Hz) with no activation intervals
    pub fn new(name: impl Into<String>, size: usize, frequency: f64) -> Result<Self> {
        if size == 0 {
            return Err(RuntimeError::invalid_parameter("size", "0", "> 0"));
        }
        if !(frequency >= 0.0) || !frequency.is_finite() {
            return Err(RuntimeError::invalid_parameter(
                "frequency",
                frequency.to_string(),
                "finite and >= 0.0",
            ));
        }
        Ok(Self {
            name: name.into(),
            size,
            frequency,
            intervals: Vec::new(),
            sim_params: None,
            schedule: Vec::new(),
            cursor: 0,
            firing: Array1::from_elem(size, false),
            outputs: Vec::new(),
            firing_time_indices: Vec::new(),
        })
    }

    /// Add an activation interval, builder style
    pub fn with_interval(mut self, start: f64, end: f64) -> Self {
        self.add_interval(start, end);
        self
    }

    /// Add an activation interval `(start, end)` in simulation time (s)
    pub fn add_interval(&mut self, start: f64, end: f64) {
        self.intervals.push((start, end));
    }

    /// Replace every activation interval
    pub fn set_intervals(&mut self, intervals: impl IntoIterator<Item = (f64, f64)>) {
        self.intervals = intervals.into_iter().collect();
    }

    /// Sort the activation intervals and check that none overlap
    pub fn validate_intervals(&mut self) -> Result<()> {
        for &(start, end) in &self.intervals {
            if !start.is_finite() || !end.is_finite() || start > end {
                return Err(RuntimeError::invalid_parameter(
                    format!("interval of {}", self.name),
                    format!("({}, {})", start, end),
                    "finite with start <= end",
                ));
            }
        }
        self.intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in self.intervals.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if !(first.1 < second.0) {
                return Err(RuntimeError::OverlappingIntervals {
                    name: self.name.clone(),
                    first_start: first.0,
                    first_end: first.1,
                    second_start: second.0,
                    second_end: second.1,
                });
            }
        }
        Ok(())
    }

    /// Provide simulation timing; required before `reset`. The schedule
    /// built at reset covers steps `0..num_steps` only.
    pub fn set_sim_params(&mut self, start_time: f64, dt: f64, num_steps: u64) {
        self.sim_params = Some((start_time, dt, num_steps));
    }

    /// Cluster name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of units
    pub fn size(&self) -> usize {
        self.size
    }

    /// Firing frequency (Hz)
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Activation intervals
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Firing flags from the most recent compute phase
    pub fn firing(&self) -> ArrayView1<'_, bool> {
        self.firing.view()
    }

    /// Output synapses, in wiring order
    pub fn outputs(&self) -> &[SynapseId] {
        &self.outputs
    }

    /// Step indices at which this cluster fired since the last reset
    pub fn firing_time_indices(&self) -> &[u64] {
        &self.firing_time_indices
    }

    /// Full schedule materialized by the last reset
    pub fn schedule(&self) -> &[u64] {
        &self.schedule
    }

    /// Next scheduled step index, or `None` once the schedule is exhausted
    pub fn next_spike_index(&self) -> Option<u64> {
        self.schedule.get(self.cursor).copied()
    }

    /// Validate intervals, materialize the schedule and reset output synapses
    pub fn reset(&mut self, synapses: &mut [SynapseCluster]) -> Result<()> {
        let (start_time, dt, num_steps) = self.sim_params.ok_or_else(|| RuntimeError::MissingSimParams {
            name: self.name.clone(),
        })?;
        self.validate_intervals()?;
        if !self.intervals.is_empty() && self.frequency * dt >= 1.0 {
            return Err(RuntimeError::invalid_parameter(
                format!("frequency of {}", self.name),
                format!("{} Hz at dt={}", self.frequency, dt),
                "< 1/dt",
            ));
        }

        self.schedule = spike_schedule(start_time, dt, num_steps, self.frequency, &self.intervals);
        self.cursor = 0;
        self.firing.fill(false);
        self.firing_time_indices.clear();
        log::debug!("{}: {} scheduled spikes", self.name, self.schedule.len());

        for id in &self.outputs {
            synapses[id.index()].reset()?;
        }
        Ok(())
    }

    /// Compute phase: fire if `time_index` is the next scheduled index, then
    /// let output synapses compute their pending gating
    pub fn compute_update(&mut self, time_index: u64, dt: f64, synapses: &mut [SynapseCluster]) {
        while self.next_spike_index().is_some_and(|index| index < time_index) {
            self.cursor += 1;
        }
        let fire = self.next_spike_index() == Some(time_index);
        if fire {
            self.cursor += 1;
            self.firing_time_indices.push(time_index);
        }
        self.firing.fill(fire);

        for id in &self.outputs {
            synapses[id.index()].compute_update(dt, self.firing.view());
        }
    }

    /// Commit phase: the cluster has no state of its own, only its synapses commit
    pub fn store_update(&mut self, synapses: &mut [SynapseCluster]) {
        for id in &self.outputs {
            synapses[id.index()].store_update();
        }
    }
}
