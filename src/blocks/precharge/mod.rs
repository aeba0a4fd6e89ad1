use arcstr::ArcStr;

use crate::composer::{DeviceModels, PiRc};
use crate::error::Result;
use crate::schematic::{Component, NetlistCtx, SchematicCtx};

use super::ModelSelection;

pub mod schematic;

pub const PRECHARGE_MODEL_COLUMNS: [&str; 1] = ["pmos_model_precharge"];

pub struct Precharge {
    params: PrechargeParams,
    models: DeviceModels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrechargeParams {
    pub pwidth: f64,
    pub length: f64,
    /// Rows sharing the bit line.
    pub num_rows: usize,
    pub rc: Option<PiRc>,
    pub models: ModelSelection,
}

impl Default for PrechargeParams {
    fn default() -> Self {
        Self {
            pwidth: 0.27e-6,
            length: 0.05e-6,
            num_rows: 16,
            rc: None,
            models: ModelSelection::default(),
        }
    }
}

impl Component for Precharge {
    type Params = PrechargeParams;
    fn new(params: &Self::Params, ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
            models: params.models.resolve(ctx, &PRECHARGE_MODEL_COLUMNS)?,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("PRECHARGE")
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}
