use crate::error::Result;
use crate::schematic::{Direction, MosType, SchematicCtx};

use super::ColumnMux;

impl ColumnMux {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let p = &self.params;
        let n = p.num_in;
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [sa_in, sa_inb] = ctx.ports(["SA_IN", "SA_INB"], Direction::Output);
        let sel = ctx.port_bus("SEL", n, Direction::Input);
        let bl = ctx.port_bus("BL", n, Direction::InOut);
        let blb = ctx.port_bus("BLB", n, Direction::InOut);

        let mode = p.models.mode;
        let nwidth = mode.resolve(p.nwidth, "nmos_width_mux");
        let pwidth = mode.resolve(p.pwidth, "pmos_width_mux");
        let length = mode.resolve(p.length, "length_mux");
        let (nmos, pmos) = (&self.models.nmos, &self.models.pmos);

        // Bit-line nets carry their own parasitics from the array.
        for i in 0..n {
            let selb = ctx.signal(format!("SELB{i}"));
            let sel_node = ctx.maybe_rc(&sel[i], 1, p.rc.as_ref())?;
            let selb_node = ctx.maybe_rc(&selb, 1, p.rc.as_ref())?;

            ctx.mos(
                &format!("Invp_{i}"),
                MosType::Pmos,
                [&selb_node, &sel_node, &vdd, &vdd],
                pmos,
                pwidth.clone(),
                length.clone(),
            )?;
            ctx.mos(
                &format!("Invn_{i}"),
                MosType::Nmos,
                [&selb_node, &sel_node, &vss, &vss],
                nmos,
                nwidth.clone(),
                length.clone(),
            )?;

            for (suffix, line, out) in [("BL", &bl[i], &sa_in), ("BLB", &blb[i], &sa_inb)] {
                ctx.mos(
                    &format!("Muxn_{suffix}_{i}"),
                    MosType::Nmos,
                    [line, &sel_node, out, &vss],
                    nmos,
                    nwidth.clone(),
                    length.clone(),
                )?;
                ctx.mos(
                    &format!("Muxp_{suffix}_{i}"),
                    MosType::Pmos,
                    [line, &selb_node, out, &vdd],
                    pmos,
                    pwidth.clone(),
                    length.clone(),
                )?;
            }
        }
        Ok(())
    }
}
