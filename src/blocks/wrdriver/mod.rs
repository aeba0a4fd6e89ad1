use arcstr::ArcStr;

use crate::composer::{DeviceModels, PiRc};
use crate::error::Result;
use crate::schematic::{Component, NetlistCtx, SchematicCtx};

use super::ModelSelection;

pub mod schematic;

pub const WRITE_DRIVER_MODEL_COLUMNS: [&str; 2] = ["pmos_model_writedriver", "nmos_model_writedriver"];

/// Drives a bit-line pair from `DIN` while `EN` is high; tri-stated otherwise.
pub struct WriteDriver {
    params: WriteDriverParams,
    models: DeviceModels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteDriverParams {
    pub nwidth: f64,
    pub pwidth: f64,
    pub length: f64,
    pub num_rows: usize,
    pub rc: Option<PiRc>,
    pub models: ModelSelection,
}

impl Default for WriteDriverParams {
    fn default() -> Self {
        Self {
            nwidth: 0.18e-6,
            pwidth: 0.36e-6,
            length: 50e-9,
            num_rows: 16,
            rc: None,
            models: ModelSelection::default(),
        }
    }
}

impl Component for WriteDriver {
    type Params = WriteDriverParams;
    fn new(params: &Self::Params, ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
            models: params.models.resolve(ctx, &WRITE_DRIVER_MODEL_COLUMNS)?,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("WRITEDRIVER")
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::paths::out_spice;
    use crate::schematic::MosType;
    use crate::tests::test_work_dir;

    use super::*;

    #[test]
    fn test_write_driver() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let work_dir = test_work_dir("test_write_driver");
        lib.write_schematic_to_file::<WriteDriver>(
            &WriteDriverParams::default(),
            out_spice(&work_dir, "netlist"),
        )?;

        let wd = lib.module("WRITEDRIVER").expect("write driver is registered");
        let ports = wd.port_names().map(|p| p.as_str()).collect::<Vec<_>>();
        assert_eq!(ports, ["VDD", "VSS", "EN", "DIN", "BL", "BLB"]);
        let names = wd.mosfets().map(|m| m.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, (1..=12).map(|i| i.to_string()).collect::<Vec<_>>());

        let bl_drivers = wd
            .mosfets()
            .filter(|m| m.d == "BL")
            .map(|m| (m.mos_type, m.s.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(bl_drivers, [(MosType::Pmos, "int1"), (MosType::Nmos, "int2")]);
        for m in wd.mosfets() {
            let expected = match m.mos_type {
                MosType::Nmos => 0.18e-6,
                MosType::Pmos => 0.36e-6,
            };
            approx::assert_relative_eq!(m.width.fixed().expect("fixed width"), expected);
        }
        Ok(())
    }

    #[test]
    fn test_write_driver_scales_with_rows() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let params = WriteDriverParams {
            num_rows: 4,
            ..Default::default()
        };
        lib.generate::<WriteDriver>(&params)?;
        let wd = lib.module("WRITEDRIVER").expect("write driver is registered");
        // Below the floor count, widths stay at half the base.
        let m2 = wd.mosfets().nth(1).expect("M2");
        assert_eq!(m2.mos_type, MosType::Nmos);
        approx::assert_relative_eq!(m2.width.fixed().expect("fixed width"), 0.09e-6);
        Ok(())
    }
}
