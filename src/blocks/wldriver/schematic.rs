use crate::blocks::gate::{Inv, Nand2};
use crate::error::Result;
use crate::schematic::{Direction, SchematicCtx};

use super::WordlineDriver;

/// Resistance tying `Z` to `WWLB`.
const WWLB_SHORT_RES: f64 = 0.001;

impl WordlineDriver {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [a, b] = ctx.ports(["A", "B"], Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let [wwla, wwlb] = ctx.ports(["WWLA", "WWLB"], Direction::Output);

        let rc = self.params.rc.as_ref();
        let a = ctx.maybe_rc(&a, 2, rc)?;
        let b = ctx.maybe_rc(&b, 2, rc)?;
        let zb = ctx.maybe_rc(&wwla, 2, rc)?;
        let z = ctx.maybe_rc(&z, 2, rc)?;

        ctx.instantiate::<Nand2>(&self.params.nand_params())?
            .with_bindings([&vdd, &vss, &a, &b, &zb])
            .named("PNAND2")
            .add_to(ctx)?;
        ctx.instantiate::<Inv>(&self.params.inv_params())?
            .with_bindings([&vdd, &vss, &zb, &z])
            .named("PINV")
            .add_to(ctx)?;
        ctx.resistor("short_z_wwlb", [&z, &wwlb], WWLB_SHORT_RES)?;
        Ok(())
    }
}
