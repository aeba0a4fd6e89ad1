use crate::blocks::scale_width;
use crate::error::Result;
use crate::schematic::{Direction, MosType, Param, SchematicCtx};

use super::WriteDriver;

impl WriteDriver {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let p = &self.params;
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [en, din] = ctx.ports(["EN", "DIN"], Direction::Input);
        let [bl, blb] = ctx.ports(["BL", "BLB"], Direction::InOut);
        let [dinb, enb] = ctx.signals(["DINB", "ENB"]);
        let [int1, int2, int3, int4] = ctx.signals(["int1", "int2", "int3", "int4"]);

        let rc = p.rc.as_ref();
        let d = ctx.maybe_rc(&din, 1, rc)?;
        let db = ctx.maybe_rc(&dinb, 1, rc)?;
        let bl_node = ctx.maybe_rc(&bl, 2, rc)?;
        let blb_node = ctx.maybe_rc(&blb, 2, rc)?;
        let en_node = ctx.maybe_rc(&en, 1, rc)?;
        let enb_node = ctx.maybe_rc(&enb, 1, rc)?;

        let mode = p.models.mode;
        let nwidth = mode.resolve(scale_width(p.nwidth, p.num_rows), "nmos_width_wrd");
        let pwidth = mode.resolve(scale_width(p.pwidth, p.num_rows), "pmos_width_wrd");
        let length = mode.resolve(p.length, "length_wrd");

        let mut mos = |name: &str, mos_type: MosType, [d, g, s]: [&str; 3]| -> Result<()> {
            let (b, model, width): (&str, &str, &Param) = match mos_type {
                MosType::Nmos => (vss.as_str(), self.models.nmos.as_str(), &nwidth),
                MosType::Pmos => (vdd.as_str(), self.models.pmos.as_str(), &pwidth),
            };
            ctx.mos(name, mos_type, [d, g, s, b], model, width.clone(), length.clone())
        };

        // Input inverters.
        mos("1", MosType::Pmos, [&dinb, &d, &vdd])?;
        mos("2", MosType::Nmos, [&dinb, &d, &vss])?;
        mos("3", MosType::Pmos, [&enb, &en_node, &vdd])?;
        mos("4", MosType::Nmos, [&enb, &en_node, &vss])?;

        // BL is driven with the complement of DIN.
        mos("5", MosType::Pmos, [&int1, &db, &vdd])?;
        mos("6", MosType::Pmos, [&bl_node, &enb_node, &int1])?;
        mos("7", MosType::Nmos, [&bl_node, &en_node, &int2])?;
        mos("8", MosType::Nmos, [&int2, &db, &vss])?;

        mos("9", MosType::Pmos, [&int3, &d, &vdd])?;
        mos("10", MosType::Pmos, [&blb_node, &enb_node, &int3])?;
        mos("11", MosType::Nmos, [&blb_node, &en_node, &int4])?;
        mos("12", MosType::Nmos, [&int4, &d, &vss])?;
        Ok(())
    }
}
