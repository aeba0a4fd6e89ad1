//! Single-cell static noise margin decks.
//!
//! The cell's storage nodes are cut from their loads (`QD`/`QBD`) and driven
//! by behavioral sources in a frame rotated by 45 degrees. Sweeping `U` along
//! the rotated axis traces both halves of the butterfly curve at once; `VD`
//! is their separation.

use super::{Operation, TbParams, SNM_CELL_INSTANCE};
use crate::blocks::bitcell::{Bitcell, BitcellParams};
use crate::error::Result;
use crate::schematic::circuit::Waveform;
use crate::schematic::{SchematicCtx, GROUND};

/// The swept rotated-axis coordinate.
pub const SWEEP_PARAM: &str = "U";

pub(crate) fn build(p: &TbParams, ctx: &mut SchematicCtx) -> Result<()> {
    let [vdd, vss] = ctx.signals(["VDD", "VSS"]);
    ctx.vsource("VDD", [&vdd, &vss], Waveform::Dc(p.vdd))?;
    ctx.vsource("VSS", [&vss, GROUND], Waveform::Dc(0.0))?;

    let [bl, wwla, wwlb, wl] = ctx.signals(["BL", "WWLA", "WWLB", "WL"]);
    let cell = BitcellParams {
        disconnect: true,
        variant: p.monte_carlo.is_custom().then_some((0, 0)),
        ..p.cell_params()
    };
    ctx.instantiate::<Bitcell>(&cell)?
        .with_bindings([&vdd, &vss, &bl, &wwla, &wwlb, &wl])
        .named(SNM_CELL_INSTANCE)
        .add_to(ctx)?;

    let (wl_level, bl_level) = match p.operation {
        Operation::HoldSnm => (0.0, p.vdd),
        Operation::ReadSnm => (p.vdd, p.vdd),
        _ => (p.vdd, 0.0),
    };
    ctx.vsource("WL", [&wl, GROUND], Waveform::Dc(wl_level))?;
    ctx.vsource("BL", [&bl, GROUND], Waveform::Dc(bl_level))?;
    ctx.vsource("WWLA", [&wwla, GROUND], Waveform::Dc(0.0))?;
    ctx.vsource("WWLB", [&wwlb, GROUND], Waveform::Dc(p.vdd))?;

    let [v1, v2, vd] = ctx.signals(["V1", "V2", "VD"]);
    let q = ctx.signal(p.cell_node("Q"));
    let qb = ctx.signal(p.cell_node("QB"));
    let qd = p.cell_node("QD");
    let qbd = p.cell_node("QBD");
    let u = SWEEP_PARAM;
    ctx.vcvs("V1", [&v1, GROUND], format!("{u}+sqrt(2)*V({qbd})"))?;
    ctx.vcvs("V2", [&v2, GROUND], format!("-{u}+sqrt(2)*V({qd})"))?;
    ctx.vcvs("Q", [&q, GROUND], format!("1/sqrt(2)*{u}+1/sqrt(2)*V(V1)"))?;
    ctx.vcvs("QB", [&qb, GROUND], format!("-1/sqrt(2)*{u}+1/sqrt(2)*V(V2)"))?;
    ctx.vcvs("VD", [&vd, GROUND], "ABS(V(V1)-V(V2))")?;
    Ok(())
}
