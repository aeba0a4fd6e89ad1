use arcstr::ArcStr;

use crate::composer::{DeviceModels, PiRc};
use crate::error::Result;
use crate::schematic::{Component, NetlistCtx, SchematicCtx, SizingMode};

use super::gate::{GateParams, GateSweepNames, PrimitiveGateParams};

pub mod schematic;

pub const WORDLINE_DRIVER_SWEEP_NAMES: GateSweepNames = GateSweepNames {
    nand_pwidth: "pmos_width_wld_nandp",
    nand_nwidth: "nmos_width_wld_nandn",
    inv_pwidth: "pmos_width_wld_invp",
    inv_nwidth: "nmos_width_wld_invn",
    length: "length_wld",
};

/// Suffix distinguishing the driver's gates from the decoder's.
pub const GATE_SUFFIX: &str = "WLD";

/// Row-select NAND followed by a wordline inverter.
///
/// The NAND output is the active-low write wordline `WWLA`; the inverter
/// output drives `Z` and, through a near-zero resistor, `WWLB`.
pub struct WordlineDriver {
    params: WordlineDriverParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordlineDriverParams {
    /// Cells on the driven row.
    pub num_cols: usize,
    pub nand: PrimitiveGateParams,
    pub inv: PrimitiveGateParams,
    pub models: DeviceModels,
    pub mode: SizingMode,
    pub rc: Option<PiRc>,
}

impl WordlineDriverParams {
    pub fn new(num_cols: usize) -> Self {
        Self {
            num_cols,
            nand: PrimitiveGateParams::nand(),
            inv: PrimitiveGateParams::inv(),
            models: DeviceModels::default(),
            mode: SizingMode::Fixed,
            rc: None,
        }
    }

    pub fn nand_drive(&self) -> f64 {
        (self.num_cols as f64 / 4.0).max(1.0)
    }

    pub fn inv_drive(&self) -> f64 {
        (self.num_cols as f64 / 2.0).max(2.0)
    }

    pub(crate) fn nand_params(&self) -> GateParams {
        let names = &WORDLINE_DRIVER_SWEEP_NAMES;
        let size = self
            .nand
            .resolve(self.mode, names.nand_nwidth, names.nand_pwidth, names.length)
            .scale(self.nand_drive());
        GateParams::new(size, self.models.clone()).with_suffix(GATE_SUFFIX)
    }

    pub(crate) fn inv_params(&self) -> GateParams {
        let names = &WORDLINE_DRIVER_SWEEP_NAMES;
        let size = self
            .inv
            .resolve(self.mode, names.inv_nwidth, names.inv_pwidth, names.length)
            .scale(self.inv_drive());
        GateParams::new(size, self.models.clone()).with_suffix(GATE_SUFFIX)
    }
}

impl Component for WordlineDriver {
    type Params = WordlineDriverParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("WORDLINEDRIVER")
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::paths::out_spice;
    use crate::schematic::circuit::Element;
    use crate::schematic::{MosType, Param};
    use crate::tests::test_work_dir;

    use super::*;

    #[test]
    fn test_wordline_driver() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let work_dir = test_work_dir("test_wordline_driver");
        lib.write_schematic_to_file::<WordlineDriver>(
            &WordlineDriverParams::new(16),
            out_spice(&work_dir, "netlist"),
        )?;

        let wld = lib.module("WORDLINEDRIVER").expect("driver is registered");
        let ports = wld.port_names().map(|p| p.as_str()).collect::<Vec<_>>();
        assert_eq!(ports, ["VDD", "VSS", "A", "B", "Z", "WWLA", "WWLB"]);
        let nand = wld.instance("PNAND2").expect("nand instance");
        assert_eq!(nand.cell, "PNAND2_WLD");
        assert_eq!(nand.conns[4], "WWLA");
        let inv = wld.instance("PINV").expect("inv instance");
        assert_eq!((inv.conns[2].as_str(), inv.conns[3].as_str()), ("WWLA", "Z"));
        let short = wld
            .elements
            .iter()
            .find_map(|e| match e {
                Element::Res(r) => Some(r),
                _ => None,
            })
            .expect("wordline short");
        assert_eq!((short.p.as_str(), short.n.as_str()), ("Z", "WWLB"));
        assert_eq!(short.value, Param::Fixed(0.001));

        // 16 columns: NAND drive 4, inverter drive 8.
        let inv = lib.module("PINV_WLD").expect("inverter is registered");
        let mn = inv.mosfets().find(|m| m.mos_type == MosType::Nmos).expect("pull-down");
        assert_relative_eq!(mn.width.fixed().expect("fixed width"), 8.0 * 0.09e-6);
        let nand = lib.module("PNAND2_WLD").expect("nand is registered");
        let mp = nand.mosfets().find(|m| m.mos_type == MosType::Pmos).expect("pull-up");
        assert_relative_eq!(mp.width.fixed().expect("fixed width"), 4.0 * 0.27e-6);
        Ok(())
    }

    #[test]
    fn test_drive_floors() {
        let params = WordlineDriverParams::new(1);
        assert_relative_eq!(params.nand_drive(), 1.0);
        assert_relative_eq!(params.inv_drive(), 2.0);
    }

    #[test]
    fn test_wordline_driver_rc() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let params = WordlineDriverParams {
            rc: Some(PiRc::default()),
            ..WordlineDriverParams::new(4)
        };
        lib.generate::<WordlineDriver>(&params)?;
        let wld = lib.module("WORDLINEDRIVER").expect("driver is registered");
        let nand = wld.instance("PNAND2").expect("nand instance");
        assert_eq!(&nand.conns[2..], ["A_end", "B_end", "WWLA_end"]);
        let inv = wld.instance("PINV").expect("inv instance");
        assert_eq!(&inv.conns[2..], ["WWLA_end", "Z_end"]);
        Ok(())
    }
}
