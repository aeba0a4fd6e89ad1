use std::fmt::{Display, Formatter};

use rust_decimal_macros::dec;

use super::{secs, Operation, TbParams};
use crate::schematic::value::fmt_sci;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MeasureKind {
    Tran,
    Dc,
}

/// A `.MEASURE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub kind: MeasureKind,
    pub name: String,
    pub expr: String,
}

impl Measurement {
    pub fn tran(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            kind: MeasureKind::Tran,
            name: name.into(),
            expr: expr.into(),
        }
    }

    pub fn dc(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            kind: MeasureKind::Dc,
            name: name.into(),
            expr: expr.into(),
        }
    }
}

impl Display for MeasureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureKind::Tran => write!(f, "TRAN"),
            MeasureKind::Dc => write!(f, "DC"),
        }
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ".MEASURE {} {} {}", self.kind, self.name, self.expr)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Edge {
    Rise,
    Fall,
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Rise => write!(f, "RISE=1"),
            Edge::Fall => write!(f, "FALL=1"),
        }
    }
}

/// `V(node)=level EDGE=1`
fn crossing(node: &str, level: f64, edge: Edge) -> String {
    format!("V({node})={level:.4} {edge}")
}

fn delay(trig: String, targ: String) -> String {
    format!("TRIG {trig} TARG {targ}")
}

fn supply_power(from: f64, to: f64) -> String {
    format!("AVG {{V(VDD)*I(VVDD)}} FROM={} TO={}", fmt_sci(from), fmt_sci(to))
}

/// Decoder and wordline-driver delays of the target row.
fn wordline_delays(p: &TbParams) -> Vec<Measurement> {
    let half = p.half_vdd();
    let row = p.target_row;
    // A0 steps towards the target address, so its direction follows bit 0.
    let a0_edge = if row & 1 == 1 { Edge::Rise } else { Edge::Fall };
    vec![
        Measurement::tran(
            "TDECODER",
            delay(
                crossing("A0", half, a0_edge),
                crossing(&format!("DEC_WL{row}"), half, Edge::Rise),
            ),
        ),
        Measurement::tran(
            "TWLDRV",
            delay(
                crossing(&format!("DEC_WL{row}"), half, Edge::Rise),
                crossing(&format!("WL{row}"), half, Edge::Rise),
            ),
        ),
    ]
}

/// Average, dynamic and static supply power over the given windows.
fn power(p: &TbParams, avg: (f64, f64), dynamic: (f64, f64)) -> Vec<Measurement> {
    let t = &p.timing;
    let static_from = secs((t.pulse + t.fall) * dec!(2));
    vec![
        Measurement::tran("PAVG", supply_power(avg.0, avg.1)),
        Measurement::tran("PDYN", supply_power(dynamic.0, dynamic.1)),
        Measurement::tran("PSTC", supply_power(static_from, secs(t.period))),
    ]
}

/// Minimum bit-line swing a read must develop.
pub const READ_SWING: f64 = 0.25;

pub fn read_measurements(p: &TbParams) -> Vec<Measurement> {
    let half = p.half_vdd();
    let (row, col) = (p.target_row, p.target_col);
    let group = p.target_group();
    let pulse = secs(p.timing.pulse);

    let mut out = vec![Measurement::tran(
        "TPRCH",
        delay(
            crossing("PRE", half, Edge::Fall),
            crossing(&format!("BL{col}"), 0.9 * p.vdd, Edge::Rise),
        ),
    )];
    out.extend(wordline_delays(p));
    out.push(Measurement::tran(
        "TWL",
        format!("WHEN {}", crossing(&format!("WL{row}"), half, Edge::Rise)),
    ));
    out.push(Measurement::tran(
        "TBL",
        format!("WHEN V(BL{col})='V(BLB{col})-{READ_SWING}' {}", Edge::Fall),
    ));
    out.push(Measurement::tran("TSWING", "PARAM='TBL-TWL'"));
    out.push(Measurement::tran(
        "TSA",
        delay(
            crossing("SAE", half, Edge::Rise),
            crossing(&format!("SA_Q{group}"), 0.1 * p.vdd, Edge::Fall),
        ),
    ));
    out.extend(power(p, (0.0, 1.5 * pulse), (0.0, pulse)));
    out
}

pub fn write_measurements(p: &TbParams) -> Vec<Measurement> {
    let half = p.half_vdd();
    let (row, col) = (p.target_row, p.target_col);
    let t = &p.timing;
    let pulse = secs(t.pulse);
    let one = p.write_value();

    let mut out = wordline_delays(p);
    let driven = if one {
        format!("BL{col}")
    } else {
        format!("BLB{col}")
    };
    out.push(Measurement::tran(
        "TWDRV",
        delay(crossing("WE", half, Edge::Rise), crossing(&driven, half, Edge::Rise)),
    ));

    let (q_level, q_edge, qb_level, qb_edge) = if one {
        (0.9 * p.vdd, Edge::Rise, 0.1 * p.vdd, Edge::Fall)
    } else {
        (0.1 * p.vdd, Edge::Fall, 0.9 * p.vdd, Edge::Rise)
    };
    let wl = crossing(&format!("WL{row}"), half, Edge::Rise);
    out.push(Measurement::tran(
        "TWRITE_Q",
        delay(wl.clone(), crossing(&p.cell_node("Q"), q_level, q_edge)),
    ));
    out.push(Measurement::tran(
        "TWRITE_QB",
        delay(wl, crossing(&p.cell_node("QB"), qb_level, qb_edge)),
    ));
    out.extend(power(
        p,
        (secs(t.pulse - t.delay), 2.0 * pulse),
        (pulse, 1.5 * pulse),
    ));
    out
}

/// The rotated-axis noise margin: the largest diagonal of the butterfly
/// curve scaled back by `1/sqrt(2)`.
pub fn snm_measurements(op: Operation) -> Vec<Measurement> {
    vec![
        Measurement::dc("MAXVD", "MAX V(VD)"),
        Measurement::dc(
            op.as_str().to_uppercase(),
            "PARAM='1/sqrt(2)*MAXVD'",
        ),
    ]
}

pub fn print_lines(p: &TbParams) -> Vec<String> {
    let (row, col) = (p.target_row, p.target_col);
    let q = p.cell_node("Q");
    let qb = p.cell_node("QB");
    match p.operation {
        Operation::Read => {
            let g = p.target_group();
            vec![
                format!(
                    ".PRINT TRAN FORMAT=NOINDEX V(SAE) V(WL{row}) V(BL{col}) V(BLB{col}) V({q}) V({qb})"
                ),
                format!(".PRINT TRAN V(SA_IN{g}) V(SA_INB{g}) V(SA_Q{g}) V(SA_QB{g})"),
            ]
        }
        Operation::Write => vec![format!(
            ".PRINT TRAN FORMAT=NOINDEX V(WE) V(WL{row}) V(BL{col}) V(BLB{col}) V({q}) V({qb})"
        )],
        _ => vec![".PRINT DC FORMAT=NOINDEX {U} V(V1) V(V2)".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_display() {
        let m = Measurement::dc("MAXVD", "MAX V(VD)");
        assert_eq!(m.to_string(), ".MEASURE DC MAXVD MAX V(VD)");
        assert_eq!(
            crossing("WL3", 0.5, Edge::Rise),
            "V(WL3)=0.5000 RISE=1"
        );
        assert_eq!(
            supply_power(0.0, 9e-9),
            "AVG {V(VDD)*I(VVDD)} FROM=0.0000e0 TO=9.0000e-9"
        );
    }

    #[test]
    fn test_snm_measurements() {
        let m = snm_measurements(Operation::ReadSnm);
        assert_eq!(m[1].to_string(), ".MEASURE DC READ_SNM PARAM='1/sqrt(2)*MAXVD'");
    }
}
