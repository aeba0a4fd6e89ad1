//! Stimulus and peripheral wiring of the read and write decks.

use arcstr::ArcStr;
use rust_decimal::Decimal;

use super::{secs, Operation, TbParams, ARRAY_INSTANCE};
use crate::blocks::array::{SramArray, SramArrayParams};
use crate::blocks::colmux::ColumnMux;
use crate::blocks::decoder::{DecoderCascade, DecoderPlan};
use crate::blocks::precharge::Precharge;
use crate::blocks::senseamp::SenseAmp;
use crate::blocks::wldriver::WordlineDriver;
use crate::blocks::wrdriver::WriteDriver;
use crate::error::Result;
use crate::schematic::circuit::{Pulse, Waveform};
use crate::schematic::{SchematicCtx, GROUND};

/// Level the target row's `WWLB` is pulled to during an assisted write.
pub const WRITE_ASSIST_LEVEL: f64 = -0.2;

/// Net bound to the target driver's `WWLB` output when write assist
/// takes over the row's `WWLB`.
pub const ASSIST_DRIVER_NET: &str = "WWLB_DRV";

fn pulse(p: &TbParams, v1: f64, v2: f64, delay: Decimal, width: Decimal) -> Waveform {
    let t = &p.timing;
    Waveform::Pulse(Pulse {
        v1,
        v2,
        delay: secs(delay),
        rise: secs(t.rise),
        fall: secs(t.fall),
        width: secs(width),
        period: secs(t.period),
    })
}

#[inline]
fn level(p: &TbParams, high: bool) -> f64 {
    if high {
        p.vdd
    } else {
        0.0
    }
}

pub(crate) fn build(p: &TbParams, ctx: &mut SchematicCtx) -> Result<()> {
    let t = p.timing;
    let (rows, cols) = (p.num_rows, p.num_cols);
    let [vdd, vss] = ctx.signals(["VDD", "VSS"]);
    ctx.vsource("VDD", [&vdd, &vss], Waveform::Dc(p.vdd))?;
    ctx.vsource("VSS", [&vss, GROUND], Waveform::Dc(0.0))?;

    // Address inputs start at the complement of the target row. The edge
    // only gives TDECODER a trigger; the row stays selected after it.
    let plan = DecoderPlan::new(rows)?;
    let addr = ctx.bus("A", plan.n_bits);
    for (bit, a) in addr.iter().enumerate() {
        let target = (p.target_row >> bit) & 1 == 1;
        ctx.vsource(
            a,
            [a, GROUND],
            pulse(p, level(p, !target), level(p, target), t.delay, t.period),
        )?;
    }
    let dec_wl = ctx.bus("DEC_WL", rows);
    let mut conns = vec![vdd.clone(), vss.clone()];
    conns.extend(addr.iter().cloned());
    conns.extend(dec_wl.iter().cloned());
    ctx.instantiate::<DecoderCascade>(&p.decoder_params())?
        .with_bindings(conns)
        .named("DEC")
        .add_to(ctx)?;

    let wl_en = ctx.signal("WL_EN");
    ctx.vsource(
        "WLE",
        [&wl_en, GROUND],
        pulse(p, 0.0, p.vdd, t.wordline_delay(), t.pulse),
    )?;

    let wl = ctx.bus("WL", rows);
    let wwla = ctx.bus("WWLA", rows);
    let wwlb = ctx.bus("WWLB", rows);
    let assist = p.write_assist && p.operation == Operation::Write;
    let assist_net = if assist {
        let net = ctx.signal(ASSIST_DRIVER_NET);
        ctx.vsource(
            "WWLB_NEG",
            [&wwlb[p.target_row], GROUND],
            pulse(p, p.vdd, WRITE_ASSIST_LEVEL, t.wordline_delay(), t.pulse),
        )?;
        Some(net)
    } else {
        None
    };
    let wld = p.wordline_driver_params();
    for row in 0..rows {
        let wwlb_net = match &assist_net {
            Some(net) if row == p.target_row => net,
            _ => &wwlb[row],
        };
        ctx.instantiate::<WordlineDriver>(&wld)?
            .with_bindings([&vdd, &vss, &dec_wl[row], &wl_en, &wl[row], &wwla[row], wwlb_net])
            .named(format!("WLD{row}"))
            .add_to(ctx)?;
    }

    let bl = ctx.bus("BL", cols);
    let blb = ctx.bus("BLB", cols);
    let mut array = SramArrayParams::new(rows, cols, p.cell_params());
    if p.monte_carlo.is_custom() {
        array = array.with_per_cell_models();
    }
    let mut conns = vec![vdd.clone(), vss.clone()];
    for bus in [&bl, &wwla, &wwlb, &wl] {
        conns.extend(bus.iter().cloned());
    }
    ctx.instantiate::<SramArray>(&array)?
        .with_bindings(conns)
        .named(ARRAY_INSTANCE)
        .add_to(ctx)?;

    match p.operation {
        Operation::Read => read_path(p, ctx, &bl, &blb),
        _ => write_path(p, ctx, &bl, &blb),
    }
}

/// Precharge, column multiplexers and sense amplifiers.
///
/// The cell has a single bit line, so each column gets a precharged `BLB`
/// reference for the differential sense amplifier.
fn read_path(p: &TbParams, ctx: &mut SchematicCtx, bl: &[ArcStr], blb: &[ArcStr]) -> Result<()> {
    let t = p.timing;
    let [vdd, vss] = [arcstr::literal!("VDD"), arcstr::literal!("VSS")];

    let pre = ctx.signal("PRE");
    ctx.vsource(
        "PRE",
        [&pre, GROUND],
        pulse(p, p.vdd, 0.0, t.delay, t.precharge_width()),
    )?;
    let precharge = p.precharge_params();
    for col in 0..p.num_cols {
        ctx.instantiate::<Precharge>(&precharge)?
            .with_bindings([&vdd, &pre, &bl[col]])
            .named(format!("PRCH{col}"))
            .add_to(ctx)?;
        ctx.instantiate::<Precharge>(&precharge)?
            .with_bindings([&vdd, &pre, &blb[col]])
            .named(format!("PRCHB{col}"))
            .add_to(ctx)?;
    }

    let m = p.mux_in;
    let sel = ctx.bus("SEL", m);
    let selected = p.target_col % m;
    for (i, s) in sel.iter().enumerate() {
        ctx.vsource(s, [s, GROUND], Waveform::Dc(level(p, i == selected)))?;
    }

    let sae = ctx.signal("SAE");
    ctx.vsource(
        "SAE",
        [&sae, GROUND],
        pulse(p, 0.0, p.vdd, t.sense_delay(), t.pulse),
    )?;

    let mux = p.column_mux_params();
    let sa = p.sense_amp_params();
    for g in 0..p.num_groups() {
        let [sa_in, sa_inb, sa_q, sa_qb] = [
            ctx.signal(format!("SA_IN{g}")),
            ctx.signal(format!("SA_INB{g}")),
            ctx.signal(format!("SA_Q{g}")),
            ctx.signal(format!("SA_QB{g}")),
        ];
        let cols = g * m..(g + 1) * m;
        let mut conns = vec![vdd.clone(), vss.clone(), sa_in.clone(), sa_inb.clone()];
        conns.extend(sel.iter().cloned());
        conns.extend(bl[cols.clone()].iter().cloned());
        conns.extend(blb[cols].iter().cloned());
        ctx.instantiate::<ColumnMux>(&mux)?
            .with_bindings(conns)
            .named(format!("MUX{g}"))
            .add_to(ctx)?;
        ctx.instantiate::<SenseAmp>(&sa)?
            .with_bindings([&vdd, &vss, &sae, &sa_in, &sa_inb, &sa_q, &sa_qb])
            .named(format!("SA{g}"))
            .add_to(ctx)?;
    }
    Ok(())
}

/// One write driver per column; only the target column is enabled.
fn write_path(p: &TbParams, ctx: &mut SchematicCtx, bl: &[ArcStr], blb: &[ArcStr]) -> Result<()> {
    let t = p.timing;
    let [vdd, vss] = [arcstr::literal!("VDD"), arcstr::literal!("VSS")];

    let we = ctx.signal("WE");
    ctx.vsource(
        "WE",
        [&we, GROUND],
        pulse(p, 0.0, p.vdd, t.delay, t.write_enable_width()),
    )?;
    let din = ctx.signal("DIN");
    ctx.vsource("DIN", [&din, GROUND], Waveform::Dc(level(p, p.write_value())))?;

    let wd = p.write_driver_params();
    for col in 0..p.num_cols {
        let en = if col == p.target_col { &we } else { &vss };
        ctx.instantiate::<WriteDriver>(&wd)?
            .with_bindings([&vdd, &vss, en, &din, &bl[col], &blb[col]])
            .named(format!("WD{col}"))
            .add_to(ctx)?;
    }
    Ok(())
}
