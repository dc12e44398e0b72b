//! Overlap counting and pathway wiring
//!
//! The number of contacts between a presynaptic unit and a postsynaptic unit
//! is the number of anatomical columns where the presynaptic unit has axonal
//! arborization and the postsynaptic unit has dendritic arborization. The
//! maximum conductance of the pair's synapse is that count times a factor
//! chosen per population pair.

use crate::{
    config::{Receptor, Receptors},
    error::*,
    table::{Atlas, OverlapTable, AXONAL, DENDRITIC},
};
use compass_runtime::Network;
use ndarray::Zip;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Count anatomical columns where `pre` is axonal in `src` and `post` is dendritic in `trg`
pub fn overlap_count(src: &OverlapTable, trg: &OverlapTable, pre: &str, post: &str) -> Result<u32> {
    if src.columns() != trg.columns() {
        return Err(ConnectomeError::ColumnMismatch {
            src: src.name().to_string(),
            trg: trg.name().to_string(),
        });
    }
    let pre_row = src.row(pre)?;
    let post_row = trg.row(post)?;
    let mut count = 0u32;
    Zip::from(&pre_row).and(&post_row).for_each(|&a, &d| {
        if a == AXONAL && d == DENDRITIC {
            count += 1;
        }
    });
    Ok(count)
}

/// Conductance factor per ordered pair of population kinds, keyed `"PRE->POST"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConductanceFactors(BTreeMap<String, f64>);

impl ConductanceFactors {
    /// Create an empty table
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    fn key(pre: &str, post: &str) -> String {
        format!("{}->{}", pre, post)
    }

    /// Set the factor for `pre -> post`
    pub fn set(&mut self, pre: &str, post: &str, factor: f64) {
        self.0.insert(Self::key(pre, post), factor);
    }

    /// Set a factor, builder style
    pub fn with(mut self, pre: &str, post: &str, factor: f64) -> Self {
        self.set(pre, post, factor);
        self
    }

    /// Factor for `pre -> post`, if configured
    pub fn get(&self, pre: &str, post: &str) -> Option<f64> {
        self.0.get(&Self::key(pre, post)).copied()
    }

    /// Factor for `pre -> post`, or an error naming the missing pair
    pub fn require(&self, pre: &str, post: &str) -> Result<f64> {
        self.get(pre, post).ok_or_else(|| ConnectomeError::MissingFactor {
            pre: pre.to_string(),
            post: post.to_string(),
        })
    }

    /// Every `(key, factor)` entry
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl Default for ConductanceFactors {
    /// Circuit values: overlap factors of the four bridge/ring pathways and
    /// the fixed conductances of the ring neurons and stimulus inputs
    fn default() -> Self {
        Self::new()
            .with("EIP", "PEI", 5.0)
            .with("EIP", "PEN", 6.0)
            .with("PEI", "EIP", 4.0)
            .with("PEN", "EIP", 6.0)
            .with("EIP", "REIP", 1.0)
            .with("REIP", "EIP", 5.0)
            .with("REIP", "REIP", 1.6)
            .with("RPEI", "PEI", 10.0)
            .with("RPEN", "PEN", 10.0)
            .with("EB_input", "EIP", 2.1)
            .with("RPEN_input", "RPEN", 10.0)
            .with("RPEI_input", "RPEI", 10.0)
            .with("rot", "PEN", 0.3)
    }
}

/// One overlap-count override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapOverride {
    /// Unit whose pairs are corrected
    pub unit: String,
    /// Pathway table the correction applies to
    pub table: String,
    /// Replacement overlap count
    pub count: u32,
}

/// Manual corrections of overlap counts keyed by `(unit, pathway table)`.
///
/// An override applies to every pair of that pathway in which the unit is
/// either the presynaptic or the postsynaptic endpoint; a presynaptic match
/// wins over a postsynaptic one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlapOverrides(Vec<OverlapOverride>);

impl OverlapOverrides {
    /// No overrides
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Add or replace the override for `(unit, table)`
    pub fn set(&mut self, unit: &str, table: &str, count: u32) {
        match self.0.iter_mut().find(|o| o.unit == unit && o.table == table) {
            Some(existing) => existing.count = count,
            None => self.0.push(OverlapOverride {
                unit: unit.to_string(),
                table: table.to_string(),
                count,
            }),
        }
    }

    /// Add an override, builder style
    pub fn with(mut self, unit: &str, table: &str, count: u32) -> Self {
        self.set(unit, table, count);
        self
    }

    fn find(&self, unit: &str, table: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|o| o.unit == unit && o.table == table)
            .map(|o| o.count)
    }

    /// Replacement count for the `(pre, post)` pair of `table`, if any
    pub fn lookup(&self, table: &str, pre: &str, post: &str) -> Option<u32> {
        self.find(pre, table).or_else(|| self.find(post, table))
    }

    /// Number of overrides
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no overrides
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for OverlapOverrides {
    /// The two edge EIP units receive three PEN contacts each (Su et al. 2017,
    /// supplementary table 3), more than the tile overlap shows
    fn default() -> Self {
        Self::none().with("EIP0", "PEN_EIP", 3).with("EIP17", "PEN_EIP", 3)
    }
}

/// Non-fatal findings while building a circuit
#[derive(Debug, Clone, PartialEq)]
pub enum DataWarning {
    /// A pathway pair has no anatomical overlap and was not connected
    ZeroOverlap {
        /// Presynaptic unit
        pre: String,
        /// Postsynaptic unit
        post: String,
        /// Pathway table
        table: String,
    },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroOverlap { pre, post, table } => {
                write!(f, "no overlap between {} and {} in {}", pre, post, table)
            }
        }
    }
}

/// An overlap count replaced by an override
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedOverride {
    /// Presynaptic unit
    pub pre: String,
    /// Postsynaptic unit
    pub post: String,
    /// Pathway table
    pub table: String,
    /// Count from the region tables
    pub measured: u32,
    /// Count used instead
    pub count: u32,
}

/// What a build produced besides the network
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Data warnings, in discovery order
    pub warnings: Vec<DataWarning>,
    /// Overrides that changed a count
    pub overrides: Vec<AppliedOverride>,
    /// Connections added per pathway table
    pub pathway_connections: BTreeMap<String, usize>,
}

impl BuildReport {
    /// Whether any data warnings were raised
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One table-driven projection between two populations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    /// Pathway table: presynaptic units as rows, postsynaptic units as columns
    pub table: String,
    /// Region table of the presynaptic population
    pub src: String,
    /// Region table of the postsynaptic population, same columns as `src`
    pub trg: String,
    /// Presynaptic population kind in the conductance-factor table
    pub pre_kind: String,
    /// Postsynaptic population kind in the conductance-factor table
    pub post_kind: String,
    /// Receptor of every synapse in the projection
    pub receptor: Receptor,
}

impl Pathway {
    /// Create an NMDA pathway
    pub fn nmda(table: &str, src: &str, trg: &str, pre_kind: &str, post_kind: &str) -> Self {
        Self {
            table: table.to_string(),
            src: src.to_string(),
            trg: trg.to_string(),
            pre_kind: pre_kind.to_string(),
            post_kind: post_kind.to_string(),
            receptor: Receptor::Nmda,
        }
    }

    /// The four projections between the bridge and the ring
    pub fn heading_circuit() -> Vec<Self> {
        vec![
            Self::nmda("EIP_PEI", "EIP_PB", "PEI_PB", "EIP", "PEI"),
            Self::nmda("EIP_PEN", "EIP_PB", "PEN_PB", "EIP", "PEN"),
            Self::nmda("PEI_EIP", "PEI_EBC", "EIP_EBC", "PEI", "EIP"),
            Self::nmda("PEN_EIP", "PEN_EBP", "EIP_EBP", "PEN", "EIP"),
        ]
    }
}

/// Add one synapse per connected pair of `pathway`, with maximum
/// conductance `factor x overlap count`. Pairs with a zero count are skipped
/// and reported. Returns the number of connections added.
pub fn connect_pathway(
    net: &mut Network,
    pathway: &Pathway,
    atlas: &Atlas,
    factors: &ConductanceFactors,
    overrides: &OverlapOverrides,
    receptors: &Receptors,
    report: &mut BuildReport,
) -> Result<usize> {
    let table = atlas.get(&pathway.table)?;
    let src = atlas.get(&pathway.src)?;
    let trg = atlas.get(&pathway.trg)?;
    let factor = factors.require(&pathway.pre_kind, &pathway.post_kind)?;

    let mut added = 0;
    for (pre, post) in table.nonzero_pairs() {
        let measured = overlap_count(src, trg, pre, post)?;
        let count = match overrides.lookup(&pathway.table, pre, post) {
            Some(count) => {
                if count != measured {
                    log::debug!(
                        "{}: {} -> {} overlap {} overridden to {}",
                        pathway.table,
                        pre,
                        post,
                        measured,
                        count
                    );
                    report.overrides.push(AppliedOverride {
                        pre: pre.to_string(),
                        post: post.to_string(),
                        table: pathway.table.clone(),
                        measured,
                        count,
                    });
                }
                count
            }
            None => measured,
        };

        if count == 0 {
            let warning = DataWarning::ZeroOverlap {
                pre: pre.to_string(),
                post: post.to_string(),
                table: pathway.table.clone(),
            };
            log::warn!("{}", warning);
            report.warnings.push(warning);
            continue;
        }

        let spec = receptors.spec(pathway.receptor, factor * count as f64);
        net.add_synapse(pre, post, spec)?;
        added += 1;
    }

    *report
        .pathway_connections
        .entry(pathway.table.clone())
        .or_insert(0) += added;
    log::debug!("{}: {} connections", pathway.table, added);
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_runtime::{NeuronCluster, NeuronParams, SimParams, SynapseKind};
    use ndarray::array;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // two units sharing two anatomical columns: a is axonal in column 0, b dendritic in column 0
    fn synthetic_atlas() -> Atlas {
        let src = OverlapTable::new(
            "A_REGION",
            labels(&["a", "x"]),
            labels(&["c0", "c1"]),
            array![[2.0, 0.0], [0.0, 0.0]],
        )
        .unwrap();
        let trg = OverlapTable::new(
            "B_REGION",
            labels(&["b", "y"]),
            labels(&["c0", "c1"]),
            array![[1.0, 0.0], [0.0, 1.0]],
        )
        .unwrap();
        let pathway = OverlapTable::new(
            "A_B",
            labels(&["a", "x"]),
            labels(&["b", "y"]),
            array![[1.0, 1.0], [0.0, 0.0]],
        )
        .unwrap();
        Atlas::new().with_table(src).with_table(trg).with_table(pathway)
    }

    fn network(names: &[&str]) -> Network {
        let mut net = Network::new(SimParams::default()).unwrap();
        for name in names {
            net.add_neuron(NeuronCluster::new(*name, 2, NeuronParams::default()).unwrap())
                .unwrap();
        }
        net
    }

    fn pathway() -> Pathway {
        Pathway::nmda("A_B", "A_REGION", "B_REGION", "A", "B")
    }

    #[test]
    fn test_overlap_count() {
        let atlas = synthetic_atlas();
        let src = atlas.get("A_REGION").unwrap();
        let trg = atlas.get("B_REGION").unwrap();
        assert_eq!(overlap_count(src, trg, "a", "b").unwrap(), 1);
        assert_eq!(overlap_count(src, trg, "a", "y").unwrap(), 0);
        assert!(overlap_count(src, trg, "z", "b").is_err());
    }

    #[test]
    fn test_column_mismatch() {
        let atlas = synthetic_atlas();
        let src = atlas.get("A_REGION").unwrap();
        let pathway = atlas.get("A_B").unwrap();
        assert!(matches!(
            overlap_count(src, pathway, "a", "b"),
            Err(ConnectomeError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn test_connect_pathway_conductance() {
        let atlas = synthetic_atlas();
        let mut net = network(&["a", "x", "b", "y"]);
        let factors = ConductanceFactors::new().with("A", "B", 4.5);
        let mut report = BuildReport::default();
        let added = connect_pathway(
            &mut net,
            &pathway(),
            &atlas,
            &factors,
            &OverlapOverrides::none(),
            &Receptors::default(),
            &mut report,
        )
        .unwrap();

        assert_eq!(added, 1);
        assert_eq!(net.connection_count(), 1);
        let syn = net.synapse("a", "b").unwrap();
        assert_eq!(syn.max_conductance(), 4.5);
        assert!(matches!(syn.kind(), SynapseKind::Nmda(_)));

        // the a -> y pair has no overlap and is reported, not connected
        assert!(net.synapse("a", "y").is_err());
        assert_eq!(
            report.warnings,
            vec![DataWarning::ZeroOverlap {
                pre: "a".into(),
                post: "y".into(),
                table: "A_B".into()
            }]
        );
        assert_eq!(report.pathway_connections["A_B"], 1);
    }

    #[test]
    fn test_override_matches_either_endpoint() {
        let atlas = synthetic_atlas();
        let mut net = network(&["a", "x", "b", "y"]);
        let factors = ConductanceFactors::new().with("A", "B", 2.0);
        let overrides = OverlapOverrides::none().with("y", "A_B", 3);
        let mut report = BuildReport::default();
        connect_pathway(&mut net, &pathway(), &atlas, &factors, &overrides, &Receptors::default(), &mut report)
            .unwrap();

        assert_eq!(net.synapse("a", "y").unwrap().max_conductance(), 6.0);
        assert_eq!(net.synapse("a", "b").unwrap().max_conductance(), 2.0);
        assert!(!report.has_warnings());
        assert_eq!(report.overrides.len(), 1);
        assert_eq!(report.overrides[0].measured, 0);
    }

    #[test]
    fn test_override_for_other_table_ignored() {
        let overrides = OverlapOverrides::default();
        assert_eq!(overrides.lookup("PEN_EIP", "PEN7", "EIP0"), Some(3));
        assert_eq!(overrides.lookup("PEN_EIP", "PEN8", "EIP17"), Some(3));
        assert_eq!(overrides.lookup("PEI_EIP", "PEI7", "EIP0"), None);
    }

    #[test]
    fn test_missing_factor() {
        let atlas = synthetic_atlas();
        let mut net = network(&["a", "x", "b", "y"]);
        let err = connect_pathway(
            &mut net,
            &pathway(),
            &atlas,
            &ConductanceFactors::new(),
            &OverlapOverrides::none(),
            &Receptors::default(),
            &mut BuildReport::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConnectomeError::MissingFactor { .. }));
    }

    #[test]
    fn test_factors_serde_keys() {
        let factors = ConductanceFactors::default();
        assert_eq!(factors.get("PEN", "EIP"), Some(6.0));
        assert_eq!(factors.get("EIP", "PEN"), Some(6.0));
        assert_eq!(factors.get("PEI", "EIP"), Some(4.0));
        assert!(factors.iter().any(|(k, _)| k == "REIP->REIP"));
    }
}
