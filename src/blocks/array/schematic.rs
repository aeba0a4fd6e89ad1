use crate::blocks::bitcell::Bitcell;
use crate::error::Result;
use crate::schematic::{Direction, SchematicCtx};

use super::{cell_instance_name, SramArray};

impl SramArray {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let p = &self.params;
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let bl = ctx.port_bus("BL", p.num_cols, Direction::InOut);
        let wwla = ctx.port_bus("WWLA", p.num_rows, Direction::Input);
        let wwlb = ctx.port_bus("WWLB", p.num_rows, Direction::Input);
        let wl = ctx.port_bus("WL", p.num_rows, Direction::Input);

        let shared = if p.per_cell_models {
            None
        } else {
            Some(ctx.lib_mut().generate::<Bitcell>(&p.cell)?)
        };

        for row in 0..p.num_rows {
            for col in 0..p.num_cols {
                let cell = match &shared {
                    Some(cell) => cell.clone(),
                    None => ctx
                        .lib_mut()
                        .generate::<Bitcell>(&p.cell.with_variant(row, col))?,
                };
                ctx.instantiate_cell(&cell)?
                    .with_bindings([&vdd, &vss, &bl[col], &wwla[row], &wwlb[row], &wl[row]])
                    .named(cell_instance_name(row, col))
                    .add_to(ctx)?;
            }
        }
        Ok(())
    }
}
