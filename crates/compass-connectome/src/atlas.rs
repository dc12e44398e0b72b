//! Built-in anatomical tables of the protocerebral bridge (PB) and
//! ellipsoid body (EB) from Su et al. 2017, supplementary tables
//!
//! Region tables mark, per unit and anatomical column, axonal (`2`) or
//! dendritic (`1`) arborization. Pathway tables mark the connected unit pairs.

use crate::table::{unit_labels, Atlas, OverlapTable, AXONAL, DENDRITIC};

/// Number of EIP (E-PG) units
pub const EIP_COUNT: usize = 18;
/// Number of PEI (P-EG) units
pub const PEI_COUNT: usize = 16;
/// Number of PEN (P-EN) units
pub const PEN_COUNT: usize = 16;

/// Glomeruli of the bridge: `PB-R8 .. PB-R0, PB-L0 .. PB-L8`
pub fn pb_labels() -> Vec<String> {
    (0..=8)
        .rev()
        .map(|i| format!("PB-R{}", i))
        .chain((0..=8).map(|i| format!("PB-L{}", i)))
        .collect()
}

fn eb_labels(layer: char) -> Vec<String> {
    (1..=8)
        .rev()
        .map(|i| format!("EB-R{}{}", i, layer))
        .chain((1..=8).map(|i| format!("EB-L{}{}", i, layer)))
        .collect()
}

/// Ellipsoid body tiles, C layer: `EB-R8C .. EB-R1C, EB-L1C .. EB-L8C`
pub fn ebc_labels() -> Vec<String> {
    eb_labels('C')
}

/// Ellipsoid body tiles, P layer: `EB-R8P .. EB-R1P, EB-L1P .. EB-L8P`
pub fn ebp_labels() -> Vec<String> {
    eb_labels('P')
}

/// `EIP0 .. EIP17`
pub fn eip_labels() -> Vec<String> {
    unit_labels("EIP", EIP_COUNT)
}

/// `PEI0 .. PEI15`
pub fn pei_labels() -> Vec<String> {
    unit_labels("PEI", PEI_COUNT)
}

/// `PEN0 .. PEN15`
pub fn pen_labels() -> Vec<String> {
    unit_labels("PEN", PEN_COUNT)
}

fn indicator(hit: bool, value: f64) -> f64 {
    if hit {
        value
    } else {
        0.0
    }
}

// EIP dendrites cover three consecutive EB tiles, except the two edge units
fn eip_eb_cell(r: usize, c: usize) -> f64 {
    let n = PEI_COUNT;
    let hit = match r {
        0 => c == 0,
        17 => c == n - 1,
        1..=8 => (0..3).any(|k| (2 * r - 2 + k) % n == c),
        _ => (0..3).any(|k| (2 * r - 3 + k) % n == c),
    };
    indicator(hit, DENDRITIC)
}

// PEI/PEN axons cover two EB tiles; unit 8 repeats unit 7 and 9.. repeat 0..
fn pe_eb_cell(r: usize, c: usize) -> f64 {
    let n = PEI_COUNT;
    let base = match r {
        0..=7 => r,
        8 => 7,
        _ => r - 9,
    };
    indicator((2 * base + 1) % n == c || (2 * base + 2) % n == c, AXONAL)
}

// PEI/PEN to EIP pathway, shared by both populations
fn pe_to_eip_cell(r: usize, c: usize) -> f64 {
    let offset = c as i64 - r as i64;
    let diagonal = [-8, -7, 1, 9, 10].contains(&offset);
    let shifted = (r < 8 && c == r + 2) || (r >= 8 && c == r);
    let edges = (r == 8 && c == EIP_COUNT - 2) || (r == 7 && c == 1);
    indicator(diagonal || shifted || edges, 1.0)
}

impl Atlas {
    /// Bridge and ring tables of the heading-direction circuit
    pub fn su_2017() -> Self {
        let eip = eip_labels();
        let pei = pei_labels();
        let pen = pen_labels();
        let pb = pb_labels();

        let eip_pb = OverlapTable::from_fn("EIP_PB", eip.clone(), pb.clone(), |r, c| {
            indicator(r == c, AXONAL)
        });
        let pei_pb = OverlapTable::from_fn("PEI_PB", pei.clone(), pb.clone(), |r, c| {
            indicator(c == r + 1, DENDRITIC)
        });
        let pen_pb = OverlapTable::from_fn("PEN_PB", pen.clone(), pb, |r, c| {
            indicator((r < 8 && c == r) || (r >= 8 && c == r + 2), DENDRITIC)
        });

        let eip_ebc = OverlapTable::from_fn("EIP_EBC", eip.clone(), ebc_labels(), eip_eb_cell);
        let pei_ebc = OverlapTable::from_fn("PEI_EBC", pei.clone(), ebc_labels(), pe_eb_cell);
        let eip_ebp = OverlapTable::from_fn("EIP_EBP", eip.clone(), ebp_labels(), eip_eb_cell);
        let pen_ebp = OverlapTable::from_fn("PEN_EBP", pen.clone(), ebp_labels(), pe_eb_cell);

        let pei_eip = OverlapTable::from_fn("PEI_EIP", pei.clone(), eip.clone(), pe_to_eip_cell);
        let pen_eip = OverlapTable::from_fn("PEN_EIP", pen.clone(), eip.clone(), pe_to_eip_cell);

        let eip_pei = OverlapTable::from_fn("EIP_PEI", eip.clone(), pei, |r, c| {
            indicator(r >= 1 && r - 1 == c, 1.0)
        });
        let eip_pen = OverlapTable::from_fn("EIP_PEN", eip, pen, |r, c| {
            indicator((r < 8 && c == r) || (r >= 10 && c == r - 2), 1.0)
        });

        [
            eip_pb, pei_pb, pen_pb, eip_ebc, pei_ebc, eip_ebp, pen_ebp, pei_eip, pen_eip, eip_pei,
            eip_pen,
        ]
        .into_iter()
        .fold(Atlas::new(), Atlas::with_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let pb = pb_labels();
        assert_eq!(pb.len(), 18);
        assert_eq!(pb[0], "PB-R8");
        assert_eq!(pb[8], "PB-R0");
        assert_eq!(pb[9], "PB-L0");
        assert_eq!(ebc_labels()[7], "EB-R1C");
        assert_eq!(ebc_labels()[8], "EB-L1C");
        assert_eq!(ebp_labels()[15], "EB-L8P");
    }

    #[test]
    fn test_table_shapes() {
        let atlas = Atlas::su_2017();
        assert_eq!(atlas.len(), 11);
        let shapes = [
            ("EIP_PB", (18, 18)),
            ("PEI_PB", (16, 18)),
            ("PEN_PB", (16, 18)),
            ("EIP_EBC", (18, 16)),
            ("PEI_EBC", (16, 16)),
            ("EIP_EBP", (18, 16)),
            ("PEN_EBP", (16, 16)),
            ("PEI_EIP", (16, 18)),
            ("PEN_EIP", (16, 18)),
            ("EIP_PEI", (18, 16)),
            ("EIP_PEN", (18, 16)),
        ];
        for (name, shape) in shapes {
            assert_eq!(atlas.get(name).unwrap().shape(), shape, "{}", name);
        }
    }

    #[test]
    fn test_bridge_tables() {
        let atlas = Atlas::su_2017();
        let eip_pb = atlas.get("EIP_PB").unwrap();
        assert_eq!(eip_pb.get("EIP4", "PB-R4").unwrap(), 2.0);
        assert_eq!(eip_pb.data().sum(), 36.0);

        // PEI rows are the inner 16 glomeruli
        let pei_pb = atlas.get("PEI_PB").unwrap();
        assert_eq!(pei_pb.get("PEI0", "PB-R7").unwrap(), 1.0);
        assert_eq!(pei_pb.get("PEI15", "PB-L7").unwrap(), 1.0);

        // PEN skip the two central glomeruli
        let pen_pb = atlas.get("PEN_PB").unwrap();
        assert_eq!(pen_pb.get("PEN7", "PB-R1").unwrap(), 1.0);
        assert_eq!(pen_pb.get("PEN8", "PB-L1").unwrap(), 1.0);
        assert_eq!(pen_pb.column("PB-R0").unwrap().sum(), 0.0);
        assert_eq!(pen_pb.column("PB-L0").unwrap().sum(), 0.0);
    }

    #[test]
    fn test_ring_tables() {
        let atlas = Atlas::su_2017();
        let eip_ebc = atlas.get("EIP_EBC").unwrap();
        assert_eq!(eip_ebc.row("EIP0").unwrap().sum(), 1.0);
        assert_eq!(eip_ebc.row("EIP17").unwrap().sum(), 1.0);
        assert_eq!(eip_ebc.row("EIP3").unwrap().sum(), 3.0);
        // row 8 wraps around to the first tile
        assert_eq!(eip_ebc.get("EIP8", "EB-L7C").unwrap(), 1.0);
        assert_eq!(eip_ebc.get("EIP8", "EB-L8C").unwrap(), 1.0);
        assert_eq!(eip_ebc.get("EIP8", "EB-R8C").unwrap(), 1.0);
        assert_eq!(eip_ebc.get("EIP8", "EB-L6C").unwrap(), 0.0);

        let pei_ebc = atlas.get("PEI_EBC").unwrap();
        assert_eq!(pei_ebc.row("PEI8").unwrap(), pei_ebc.row("PEI7").unwrap());
        assert_eq!(pei_ebc.row("PEI9").unwrap(), pei_ebc.row("PEI0").unwrap());
        assert_eq!(pei_ebc.row("PEI15").unwrap(), pei_ebc.row("PEI6").unwrap());
        assert_eq!(pei_ebc.get("PEI7", "EB-R8C").unwrap(), 2.0);

        assert_eq!(
            atlas.get("EIP_EBP").unwrap().data(),
            eip_ebc.data(),
        );
        assert_eq!(atlas.get("PEN_EBP").unwrap().data(), pei_ebc.data());
    }

    #[test]
    fn test_pathway_tables() {
        let atlas = Atlas::su_2017();
        let pen_eip = atlas.get("PEN_EIP").unwrap();
        assert_eq!(pen_eip.data(), atlas.get("PEI_EIP").unwrap().data());
        assert_eq!(pen_eip.get("PEN7", "EIP0").unwrap(), 1.0);
        assert_eq!(pen_eip.get("PEN8", "EIP0").unwrap(), 1.0);
        assert_eq!(pen_eip.get("PEN7", "EIP1").unwrap(), 1.0);
        assert_eq!(pen_eip.get("PEN8", "EIP16").unwrap(), 1.0);

        let eip_pei = atlas.get("EIP_PEI").unwrap();
        assert_eq!(eip_pei.row("EIP0").unwrap().sum(), 0.0);
        assert_eq!(eip_pei.row("EIP17").unwrap().sum(), 0.0);
        assert_eq!(eip_pei.get("EIP1", "PEI0").unwrap(), 1.0);

        let eip_pen = atlas.get("EIP_PEN").unwrap();
        assert_eq!(eip_pen.get("EIP7", "PEN7").unwrap(), 1.0);
        assert_eq!(eip_pen.get("EIP10", "PEN8").unwrap(), 1.0);
        assert_eq!(eip_pen.row("EIP8").unwrap().sum(), 0.0);
        assert_eq!(eip_pen.row("EIP9").unwrap().sum(), 0.0);
    }
}
