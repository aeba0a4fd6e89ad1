use crate::error::Result;
use crate::schematic::{Direction, MosType, SchematicCtx};

use super::{And2, And3, Buff, Inv, Nand2, Nand3};

impl Inv {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let a = ctx.port("A", Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let p = &self.params;

        ctx.mos(
            "mp",
            MosType::Pmos,
            [&z, &a, &vdd, &vdd],
            &p.models.pmos,
            p.size.pwidth.clone(),
            p.size.length.clone(),
        )?;
        ctx.mos(
            "mn",
            MosType::Nmos,
            [&z, &a, &vss, &vss],
            &p.models.nmos,
            p.size.nwidth.clone(),
            p.size.length.clone(),
        )?;
        Ok(())
    }
}

impl Nand2 {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [a, b] = ctx.ports(["A", "B"], Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let n1 = ctx.signal("n1");
        let p = &self.params;

        for (name, input) in [("mp1", &a), ("mp2", &b)] {
            ctx.mos(
                name,
                MosType::Pmos,
                [&z, input, &vdd, &vdd],
                &p.models.pmos,
                p.size.pwidth.clone(),
                p.size.length.clone(),
            )?;
        }
        ctx.mos(
            "mn1",
            MosType::Nmos,
            [&z, &b, &n1, &vss],
            &p.models.nmos,
            p.size.nwidth.clone(),
            p.size.length.clone(),
        )?;
        ctx.mos(
            "mn2",
            MosType::Nmos,
            [&n1, &a, &vss, &vss],
            &p.models.nmos,
            p.size.nwidth.clone(),
            p.size.length.clone(),
        )?;
        Ok(())
    }
}

impl Nand3 {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [a, b, c] = ctx.ports(["A", "B", "C"], Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let [n1, n2] = ctx.signals(["n1", "n2"]);
        let p = &self.params;

        for (name, input) in [("mp1", &a), ("mp2", &b), ("mp3", &c)] {
            ctx.mos(
                name,
                MosType::Pmos,
                [&z, input, &vdd, &vdd],
                &p.models.pmos,
                p.size.pwidth.clone(),
                p.size.length.clone(),
            )?;
        }
        // Series pull-down, A nearest ground.
        for (name, [d, g, s]) in [
            ("mn1", [&n1, &a, &vss]),
            ("mn2", [&n2, &b, &n1]),
            ("mn3", [&z, &c, &n2]),
        ] {
            ctx.mos(
                name,
                MosType::Nmos,
                [d, g, s, &vss],
                &p.models.nmos,
                p.size.nwidth.clone(),
                p.size.length.clone(),
            )?;
        }
        Ok(())
    }
}

impl Buff {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let a = ctx.port("A", Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let n1 = ctx.signal("n1");
        let p = &self.params;

        for (stage, input, output) in [("1", &a, &n1), ("2", &n1, &z)] {
            ctx.mos(
                &format!("mp{stage}"),
                MosType::Pmos,
                [output, input, &vdd, &vdd],
                &p.models.pmos,
                p.size.pwidth.clone(),
                p.size.length.clone(),
            )?;
            ctx.mos(
                &format!("mn{stage}"),
                MosType::Nmos,
                [output, input, &vss, &vss],
                &p.models.nmos,
                p.size.nwidth.clone(),
                p.size.length.clone(),
            )?;
        }
        Ok(())
    }
}

impl And2 {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [a, b] = ctx.ports(["A", "B"], Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let zb = ctx.signal("zb_int");
        let rc = self.params.rc.as_ref();

        let a = ctx.maybe_rc(&a, 2, rc)?;
        let b = ctx.maybe_rc(&b, 2, rc)?;
        let zb_in = ctx.maybe_rc(&zb, 2, rc)?;
        let z = ctx.maybe_rc(&z, 2, rc)?;

        ctx.instantiate::<Nand2>(&self.params.nand_params())?
            .with_bindings([&vdd, &vss, &a, &b, &zb])
            .named("PNAND2")
            .add_to(ctx)?;
        ctx.instantiate::<Inv>(&self.params.inv_params())?
            .with_bindings([&vdd, &vss, &zb_in, &z])
            .named("PINV")
            .add_to(ctx)?;
        Ok(())
    }
}

impl And3 {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let [a, b, c] = ctx.ports(["A", "B", "C"], Direction::Input);
        let z = ctx.port("Z", Direction::Output);
        let zb = ctx.signal("zb_int");
        let rc = self.params.rc.as_ref();

        let a = ctx.maybe_rc(&a, 2, rc)?;
        let b = ctx.maybe_rc(&b, 2, rc)?;
        let c = ctx.maybe_rc(&c, 2, rc)?;
        let zb_in = ctx.maybe_rc(&zb, 2, rc)?;
        let z = ctx.maybe_rc(&z, 2, rc)?;

        ctx.instantiate::<Nand3>(&self.params.nand_params())?
            .with_bindings([&vdd, &vss, &a, &b, &c, &zb])
            .named("PNAND3")
            .add_to(ctx)?;
        ctx.instantiate::<Inv>(&self.params.inv_params())?
            .with_bindings([&vdd, &vss, &zb_in, &z])
            .named("PINV")
            .add_to(ctx)?;
        Ok(())
    }
}
