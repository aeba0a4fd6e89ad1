use crate::blocks::scale_width;
use crate::error::Result;
use crate::schematic::{Direction, MosType, SchematicCtx};

use super::Precharge;

impl Precharge {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let p = &self.params;
        let vdd = ctx.port("VDD", Direction::InOut);
        let enb = ctx.port("ENB", Direction::Input);
        let bl = ctx.port("BL", Direction::InOut);

        let rc = p.rc.as_ref();
        let bl = ctx.maybe_rc(&bl, 2, rc)?;
        let enb = ctx.maybe_rc(&enb, 1, rc)?;

        let mode = p.models.mode;
        ctx.mos(
            "P_PRE",
            MosType::Pmos,
            [&bl, &enb, &vdd, &vdd],
            &self.models.pmos,
            mode.resolve(scale_width(p.pwidth, p.num_rows), "pmos_width_precharge"),
            mode.resolve(p.length, "length_precharge"),
        )?;
        Ok(())
    }
}
