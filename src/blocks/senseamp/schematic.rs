use crate::error::Result;
use crate::schematic::{Direction, MosType, Param, SchematicCtx};

use super::{SenseAmp, PASS_WIDTH_RATIO};

impl SenseAmp {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let p = &self.params;
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [en, inp, inb] = ctx.ports(["EN", "IN", "INB"], Direction::Input);
        let [q, qb] = ctx.ports(["Q", "QB"], Direction::Output);
        let net1 = ctx.signal("net1");

        let rc = p.rc.as_ref();
        let en_node = ctx.maybe_rc(&en, 2, rc)?;
        let in_node = ctx.maybe_rc(&inp, 2, rc)?;
        let inb_node = ctx.maybe_rc(&inb, 2, rc)?;
        let q_node = ctx.maybe_rc(&q, 2, rc)?;
        let qb_node = ctx.maybe_rc(&qb, 2, rc)?;
        let net1_node = ctx.maybe_rc(&net1, 1, rc)?;

        let mode = p.models.mode;
        let nwidth = mode.resolve(p.nwidth, "nmos_width_senseamp");
        let pwidth = mode.resolve(p.pwidth, "pmos_width_senseamp");
        let pass_width = mode.resolve(p.pwidth * PASS_WIDTH_RATIO, "pmos_width_senseamp");
        let length = mode.resolve(p.length, "length_senseamp");
        let (nmos, pmos) = (&self.models.nmos, &self.models.pmos);

        let devices: [(&str, MosType, [&str; 4], &Param); 7] = [
            ("1", MosType::Nmos, [&q, &qb_node, &net1, &vss], &nwidth),
            ("2", MosType::Pmos, [&q, &qb_node, &vdd, &vdd], &pwidth),
            ("3", MosType::Nmos, [&qb, &q_node, &net1, &vss], &nwidth),
            ("4", MosType::Pmos, [&qb, &q_node, &vdd, &vdd], &pwidth),
            ("5", MosType::Pmos, [&q, &en_node, &in_node, &vdd], &pass_width),
            ("6", MosType::Pmos, [&qb, &en_node, &inb_node, &vdd], &pass_width),
            ("7", MosType::Nmos, [&net1_node, &en_node, &vss, &vss], &nwidth),
        ];
        for (name, mos_type, terminals, width) in devices {
            let model = match mos_type {
                MosType::Nmos => nmos,
                MosType::Pmos => pmos,
            };
            ctx.mos(name, mos_type, terminals, model, width.clone(), length.clone())?;
        }
        Ok(())
    }
}
