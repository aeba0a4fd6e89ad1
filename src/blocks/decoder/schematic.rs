use arcstr::ArcStr;

use crate::blocks::gate::{And2, And3, Inv};
use crate::error::Result;
use crate::schematic::{Direction, SchematicCtx};

use super::{Decoder3To8, DecoderCascade, BLOCK_BITS, BLOCK_OUTPUTS};

impl Decoder3To8 {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let en = ctx.port("EN", Direction::Input);
        let [a2, a1, a0] = ctx.ports(["A2", "A1", "A0"], Direction::Input);
        let wl = ctx.port_bus("WL", BLOCK_OUTPUTS, Direction::Output);
        let addr = [a0, a1, a2];

        let mut addr_b = Vec::with_capacity(BLOCK_BITS);
        for (k, a) in addr.iter().enumerate() {
            let ab = ctx.signal(format!("A{k}b"));
            ctx.instantiate::<Inv>(&self.params.inv_params())?
                .with_bindings([&vdd, &vss, a, &ab])
                .named(format!("INV_A{k}"))
                .add_to(ctx)?;
            addr_b.push(ab);
        }

        for (i, wl) in wl.iter().enumerate() {
            let [x0, x1, x2]: [&ArcStr; BLOCK_BITS] = std::array::from_fn(|k| {
                if (i >> k) & 1 == 1 {
                    &addr[k]
                } else {
                    &addr_b[k]
                }
            });
            let pre = ctx.signal(format!("WL{i}_pre"));
            ctx.instantiate::<And3>(&self.params)?
                .with_bindings([&vdd, &vss, x0, x1, x2, &pre])
                .named(format!("AND{i}"))
                .add_to(ctx)?;
            ctx.instantiate::<And2>(&self.params)?
                .with_bindings([&vdd, &vss, &pre, &en, wl])
                .named(format!("AND_EN{i}"))
                .add_to(ctx)?;
        }
        Ok(())
    }
}

impl DecoderCascade {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let plan = &self.plan;
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        ctx.port_bus("A", plan.n_bits, Direction::Input);
        ctx.port_bus("WL", plan.num_rows, Direction::Output);

        let block = ctx.lib_mut().generate::<Decoder3To8>(&self.params.gates)?;

        for level in 0..plan.n_levels {
            let [a0, a1, a2] = plan.address_nets(level);
            for b in 0..plan.level_sizes[level] {
                let en = plan.enable_net(level, b);
                let outputs = plan.output_nets(level, b);
                for net in outputs.iter() {
                    ctx.signal(net.clone());
                }

                let mut conns = vec![vdd.clone(), vss.clone(), en, a2.clone(), a1.clone(), a0.clone()];
                conns.extend(outputs);
                ctx.instantiate_cell(&block)?
                    .with_bindings(conns)
                    .named(format!("DEC_{level}_{b}"))
                    .add_to(ctx)?;
            }
        }
        Ok(())
    }
}
