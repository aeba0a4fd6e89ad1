use arcstr::ArcStr;

use crate::composer::{DeviceModels, PiRc};
use crate::error::{Result, StructuralError};
use crate::schematic::{Component, NetlistCtx, SchematicCtx};

use super::ModelSelection;

pub mod schematic;

pub const COLUMN_MUX_MODEL_COLUMNS: [&str; 2] = ["pmos_model_columnmux", "nmos_model_columnmux"];

/// Selects one of `num_in` bit-line pairs onto the sense-amplifier inputs
/// through transmission gates.
pub struct ColumnMux {
    params: ColumnMuxParams,
    models: DeviceModels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMuxParams {
    /// Columns multiplexed onto one output pair.
    pub num_in: usize,
    pub nwidth: f64,
    pub pwidth: f64,
    pub length: f64,
    pub rc: Option<PiRc>,
    pub models: ModelSelection,
}

impl ColumnMuxParams {
    pub fn new(num_in: usize) -> Self {
        Self {
            num_in,
            nwidth: 0.135e-6,
            pwidth: 0.135e-6,
            length: 50e-9,
            rc: None,
            models: ModelSelection::default(),
        }
    }
}

impl Component for ColumnMux {
    type Params = ColumnMuxParams;
    fn new(params: &Self::Params, ctx: &NetlistCtx) -> Result<Self> {
        if params.num_in == 0 {
            return Err(StructuralError::EmptyDimension("num_in").into());
        }
        Ok(Self {
            params: params.clone(),
            models: params.models.resolve(ctx, &COLUMN_MUX_MODEL_COLUMNS)?,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("COLUMNMUX{}", self.params.num_in)
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
    fn test_column_mux() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let work_dir = test_work_dir("test_column_mux");
        let name = lib.write_schematic_to_file::<ColumnMux>(
            &ColumnMuxParams::new(2),
            out_spice(&work_dir, "netlist"),
        )?;
        assert_eq!(name, "COLUMNMUX2");

        let mux = lib.module(&name).expect("mux is registered");
        let ports = mux.port_names().map(|p| p.as_str()).collect::<Vec<_>>();
        assert_eq!(
            ports,
            ["VDD", "VSS", "SA_IN", "SA_INB", "SEL0", "SEL1", "BL0", "BL1", "BLB0", "BLB1"]
        );
        assert_eq!(mux.mosfets().count(), 12);
        let pass = mux
            .mosfets()
            .find(|m| m.name == "Muxp_BLB_1")
            .expect("pass device");
        assert_eq!(pass.mos_type, MosType::Pmos);
        assert_eq!(
            [pass.d.as_str(), pass.g.as_str(), pass.s.as_str(), pass.b.as_str()],
            ["BLB1", "SELB1", "SA_INB", "VDD"]
        );
        Ok(())
    }

    #[test]
    fn test_empty_column_mux() {
        let mut lib = NetlistCtx::new();
        assert!(lib.generate::<ColumnMux>(&ColumnMuxParams::new(0)).is_err());
    }
}
