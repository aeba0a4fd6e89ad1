use arcstr::ArcStr;

use crate::composer::{DeviceModels, PiRc};
use crate::error::Result;
use crate::schematic::{Component, NetlistCtx, SchematicCtx};

use super::ModelSelection;

pub mod schematic;

pub const SENSE_AMP_MODEL_COLUMNS: [&str; 2] = ["pmos_model_senseamp", "nmos_model_senseamp"];

/// Ratio of the input pass devices to the latch pull-ups.
pub const PASS_WIDTH_RATIO: f64 = 4.0 / 3.0;

/// A latch-type sense amplifier with PMOS input pass devices.
pub struct SenseAmp {
    params: SenseAmpParams,
    models: DeviceModels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SenseAmpParams {
    pub nwidth: f64,
    pub pwidth: f64,
    pub length: f64,
    pub rc: Option<PiRc>,
    pub models: ModelSelection,
}

impl Default for SenseAmpParams {
    fn default() -> Self {
        Self {
            nwidth: 0.27e-6,
            pwidth: 0.54e-6,
            length: 50e-9,
            rc: None,
            models: ModelSelection::default(),
        }
    }
}

impl Component for SenseAmp {
    type Params = SenseAmpParams;
    fn new(params: &Self::Params, ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
            models: params.models.resolve(ctx, &SENSE_AMP_MODEL_COLUMNS)?,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("SENSEAMP")
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::composer::{ModelChoices, ModelIndex};
    use crate::error::{ConfigError, Error};
    use crate::paths::out_spice;
    use crate::tests::test_work_dir;

    use super::*;

    #[test]
    fn test_sense_amp() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let work_dir = test_work_dir("test_sense_amp");
        lib.write_schematic_to_file::<SenseAmp>(&SenseAmpParams::default(), out_spice(&work_dir, "netlist"))?;

        let sa = lib.module("SENSEAMP").expect("sense amp is registered");
        let ports = sa.port_names().map(|p| p.as_str()).collect::<Vec<_>>();
        assert_eq!(ports, ["VDD", "VSS", "EN", "IN", "INB", "Q", "QB"]);
        assert_eq!(sa.mosfets().count(), 7);
        let m5 = sa.mosfets().find(|m| m.name == "5").expect("M5");
        assert_eq!((m5.d.as_str(), m5.g.as_str(), m5.s.as_str()), ("Q", "EN", "IN"));
        approx::assert_relative_eq!(m5.width.fixed().expect("fixed width"), 0.72e-6);
        let m7 = sa.mosfets().find(|m| m.name == "7").expect("M7");
        assert_eq!((m7.d.as_str(), m7.s.as_str()), ("net1", "VSS"));
        Ok(())
    }

    #[test]
    fn test_sense_amp_rc() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let params = SenseAmpParams {
            rc: Some(PiRc::default()),
            ..Default::default()
        };
        lib.generate::<SenseAmp>(&params)?;
        let sa = lib.module("SENSEAMP").expect("sense amp is registered");
        let m7 = sa.mosfets().find(|m| m.name == "7").expect("M7");
        assert_eq!((m7.d.as_str(), m7.g.as_str()), ("net1_end", "EN_end"));
        let m1 = sa.mosfets().find(|m| m.name == "1").expect("M1");
        assert_eq!((m1.d.as_str(), m1.g.as_str(), m1.s.as_str()), ("Q", "QB_end", "net1"));
        Ok(())
    }

    #[test]
    fn test_missing_model_column() -> Result<()> {
        let index = ModelIndex::parse("models.txt", "pmos_model_senseamp\n0\n")?;
        let mut lib = NetlistCtx::with_model_index(Arc::new(index));
        let params = SenseAmpParams {
            models: ModelSelection::default().symbolic(ModelChoices::default()),
            ..Default::default()
        };
        let err = lib.generate::<SenseAmp>(&params).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingColumn { ref column, .. }) if column == "nmos_model_senseamp"
        ));
        Ok(())
    }
}
