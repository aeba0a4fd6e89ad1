use arcstr::ArcStr;

use crate::error::Result;
use crate::schematic::{Direction, SchematicCtx};

use super::{width_param_name, Bitcell, DEVICES, LENGTH_PARAM_NAME};

impl Bitcell {
    pub(crate) fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        let p = &self.params;
        let [vdd, vss] = ctx.ports(["VDD", "VSS"], Direction::InOut);
        let bl = ctx.port("BL", Direction::InOut);
        let [wwla, wwlb, wl] = ctx.ports(["WWLA", "WWLB", "WL"], Direction::Input);
        let [q, qb, pul_int, pdl_int, vx] = ctx.signals(["Q", "QB", "N_PUL_INT", "N_PDL_INT", "VX"]);

        let rc = p.rc.as_ref();
        let bl = ctx.maybe_rc(&bl, 1, rc)?;
        let wwla = ctx.maybe_rc(&wwla, 1, rc)?;
        let wwlb = ctx.maybe_rc(&wwlb, 1, rc)?;
        let wl = ctx.maybe_rc(&wl, 1, rc)?;
        let q = ctx.maybe_rc(&q, 1, rc)?;
        let qb = ctx.maybe_rc(&qb, 1, rc)?;

        let (data_q, data_qb) = if p.disconnect {
            let [qd, qbd] = ctx.signals(["QD", "QBD"]);
            (qd, qbd)
        } else {
            (q.clone(), qb.clone())
        };

        // Drain, gate, source, bulk of each entry in `DEVICES`.
        let terminals: [[&ArcStr; 4]; 9] = [
            [&bl, &wl, &data_q, &vss],
            [&pul_int, &qb, &vdd, &vdd],
            [&data_q, &wwla, &pul_int, &vdd],
            [&data_q, &wwlb, &pdl_int, &vss],
            [&pdl_int, &qb, &vss, &vss],
            [&qb, &q, &vdd, &vdd],
            [&data_qb, &q, &vx, &vss],
            [&vx, &q, &vss, &vss],
            [&vx, &qb, &wwlb, &vss],
        ];

        let length = p.mode.resolve(p.length, LENGTH_PARAM_NAME);
        for (dev, [d, g, s, b]) in DEVICES.iter().zip(terminals) {
            let base = p.models.base(dev.class);
            let model = match p.variant {
                Some((row, col)) => ctx.lib_mut().variants_mut().register(base, dev.role, row, col)?,
                None => base.clone(),
            };
            let width = p.mode.resolve(p.width(dev.class), width_param_name(dev.class));
            ctx.mos(dev.role, dev.mos_type, [d, g, s, b], &model, width, length.clone())?;
        }
        Ok(())
    }
}
