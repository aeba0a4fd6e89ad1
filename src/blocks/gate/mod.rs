use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::composer::{DeviceModels, PiRc};
use crate::error::Result;
use crate::schematic::{Component, NetlistCtx, Param, SchematicCtx, SizingMode};

pub mod schematic;

pub struct Inv {
    params: GateParams,
}

pub struct Nand2 {
    params: GateParams,
}

pub struct Nand3 {
    params: GateParams,
}

pub struct Buff {
    params: GateParams,
}

pub struct And2 {
    params: AndParams,
}

pub struct And3 {
    params: AndParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveGateParams {
    pub nwidth: Param,
    pub pwidth: Param,
    pub length: Param,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateParams {
    pub size: PrimitiveGateParams,
    pub models: DeviceModels,
    /// Distinguishes gates sized for a particular parent, e.g. `WLD`.
    pub suffix: Option<ArcStr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AndParams {
    pub nand: PrimitiveGateParams,
    pub inv: PrimitiveGateParams,
    pub models: DeviceModels,
    pub rc: Option<PiRc>,
    pub suffix: Option<ArcStr>,
}

/// Symbolic parameter names for a gate pair inside a sweepable block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GateSweepNames {
    pub nand_pwidth: &'static str,
    pub nand_nwidth: &'static str,
    pub inv_pwidth: &'static str,
    pub inv_nwidth: &'static str,
    pub length: &'static str,
}

impl PrimitiveGateParams {
    pub fn new(nwidth: f64, pwidth: f64, length: f64) -> Self {
        Self {
            nwidth: nwidth.into(),
            pwidth: pwidth.into(),
            length: length.into(),
        }
    }

    pub fn inv() -> Self {
        Self::new(0.09e-6, 0.27e-6, 0.05e-6)
    }

    pub fn nand() -> Self {
        Self::new(0.18e-6, 0.27e-6, 0.05e-6)
    }

    pub fn buff() -> Self {
        Self::new(0.1e-6, 0.1e-6, 0.05e-6)
    }

    /// Resolves each size against `mode`, naming the swept parameters.
    pub fn resolve(&self, mode: SizingMode, nwidth: &str, pwidth: &str, length: &str) -> Self {
        match mode {
            SizingMode::Fixed => self.clone(),
            SizingMode::Symbolic => Self {
                nwidth: Param::Symbolic(nwidth.into()),
                pwidth: Param::Symbolic(pwidth.into()),
                length: Param::Symbolic(length.into()),
            },
        }
    }

    /// Scales both widths by a drive factor; the length is unchanged.
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            nwidth: self.nwidth.scale(factor),
            pwidth: self.pwidth.scale(factor),
            length: self.length.clone(),
        }
    }
}

impl GateParams {
    pub fn new(size: PrimitiveGateParams, models: DeviceModels) -> Self {
        Self {
            size,
            models,
            suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<ArcStr>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}

impl AndParams {
    pub fn new(models: DeviceModels) -> Self {
        Self {
            nand: PrimitiveGateParams::nand(),
            inv: PrimitiveGateParams::inv(),
            models,
            rc: None,
            suffix: None,
        }
    }

    pub fn resolve(&self, mode: SizingMode, names: &GateSweepNames) -> Self {
        Self {
            nand: self
                .nand
                .resolve(mode, names.nand_nwidth, names.nand_pwidth, names.length),
            inv: self
                .inv
                .resolve(mode, names.inv_nwidth, names.inv_pwidth, names.length),
            ..self.clone()
        }
    }

    pub(crate) fn nand_params(&self) -> GateParams {
        GateParams {
            size: self.nand.clone(),
            models: self.models.clone(),
            suffix: self.suffix.clone(),
        }
    }

    pub(crate) fn inv_params(&self) -> GateParams {
        GateParams {
            size: self.inv.clone(),
            models: self.models.clone(),
            suffix: self.suffix.clone(),
        }
    }
}

/// `base`, then `_{suffix}` when present, then `_RC` when parasitics are on.
pub fn gate_name(base: &str, suffix: Option<&str>, rc: bool) -> ArcStr {
    let mut name = base.to_string();
    if let Some(suffix) = suffix {
        name.push('_');
        name.push_str(suffix);
    }
    if rc {
        name.push_str("_RC");
    }
    name.into()
}

macro_rules! primitive_gate {
    ($gate:ident, $base:literal) => {
        impl Component for $gate {
            type Params = GateParams;
            fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
                Ok(Self {
                    params: params.clone(),
                })
            }

            fn name(&self) -> ArcStr {
                gate_name($base, self.params.suffix.as_deref(), false)
            }

            fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
                self.schematic(ctx)
            }
        }
    };
}

primitive_gate!(Inv, "PINV");
primitive_gate!(Nand2, "PNAND2");
primitive_gate!(Nand3, "PNAND3");
primitive_gate!(Buff, "PBUFF");

impl Component for And2 {
    type Params = AndParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        gate_name("AND2", self.params.suffix.as_deref(), self.params.rc.is_some())
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}

impl Component for And3 {
    type Params = AndParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        gate_name("AND3", self.params.suffix.as_deref(), self.params.rc.is_some())
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}
