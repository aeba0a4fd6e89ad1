use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::composer::PiRc;
use crate::error::Result;
use crate::schematic::{Component, MosType, NetlistCtx, SchematicCtx, SizingMode};

pub mod schematic;

pub const BITCELL_NAME: &str = "SRAM_9T_CELL";

/// Diffusion-to-diffusion or diffusion-to-metal spacing used by the area estimate.
pub const CELL_SPACING: f64 = 0.05e-6;

/// Per-device width class of the 9T cell.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeviceClass {
    PullDown,
    PullUp,
    PassGate,
}

/// One transistor of the cell: role name, type, and width class.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CellDevice {
    pub role: &'static str,
    pub mos_type: MosType,
    pub class: DeviceClass,
}

const fn device(role: &'static str, mos_type: MosType, class: DeviceClass) -> CellDevice {
    CellDevice {
        role,
        mos_type,
        class,
    }
}

/// The nine devices in netlist order.
pub const DEVICES: [CellDevice; 9] = [
    device("PG", MosType::Nmos, DeviceClass::PassGate),
    device("PUL1", MosType::Pmos, DeviceClass::PullUp),
    device("PUL2", MosType::Pmos, DeviceClass::PullUp),
    device("PDL1", MosType::Nmos, DeviceClass::PullDown),
    device("PDL2", MosType::Nmos, DeviceClass::PullDown),
    device("PUR", MosType::Pmos, DeviceClass::PullUp),
    device("PDR1", MosType::Nmos, DeviceClass::PullDown),
    device("PDR2", MosType::Nmos, DeviceClass::PullDown),
    device("NF", MosType::Nmos, DeviceClass::PullDown),
];

/// A 9-transistor Schmitt-trigger cell with a single read/write bit line.
///
/// `WWLA` and `WWLB` gate the left pull-up and pull-down stacks, letting a
/// write overpower the cell from `BL` alone.
pub struct Bitcell {
    params: BitcellParams,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BitcellModels {
    pub pd_nmos: ArcStr,
    pub pu_pmos: ArcStr,
    pub pg_nmos: ArcStr,
}

impl Default for BitcellModels {
    fn default() -> Self {
        Self {
            pd_nmos: arcstr::literal!("NMOS_VTG"),
            pu_pmos: arcstr::literal!("PMOS_VTG"),
            pg_nmos: arcstr::literal!("NMOS_VTG"),
        }
    }
}

impl BitcellModels {
    pub fn base(&self, class: DeviceClass) -> &ArcStr {
        match class {
            DeviceClass::PullDown => &self.pd_nmos,
            DeviceClass::PullUp => &self.pu_pmos,
            DeviceClass::PassGate => &self.pg_nmos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitcellParams {
    pub pd_width: f64,
    pub pu_width: f64,
    pub pg_width: f64,
    pub length: f64,
    pub models: BitcellModels,
    pub mode: SizingMode,
    pub rc: Option<PiRc>,
    /// Drives the storage nodes' loads from `QD`/`QBD`, leaving `Q`/`QB`
    /// free to be forced by a testbench.
    pub disconnect: bool,
    /// Array coordinate of a cell with its own model variants.
    pub variant: Option<(usize, usize)>,
}

impl Default for BitcellParams {
    fn default() -> Self {
        Self {
            pd_width: 0.205e-6,
            pu_width: 0.09e-6,
            pg_width: 0.135e-6,
            length: 50e-9,
            models: BitcellModels::default(),
            mode: SizingMode::Fixed,
            rc: None,
            disconnect: false,
            variant: None,
        }
    }
}

impl BitcellParams {
    pub fn width(&self, class: DeviceClass) -> f64 {
        match class {
            DeviceClass::PullDown => self.pd_width,
            DeviceClass::PullUp => self.pu_width,
            DeviceClass::PassGate => self.pg_width,
        }
    }

    fn role_width(&self, role: &str) -> f64 {
        DEVICES
            .iter()
            .find(|d| d.role == role)
            .map_or(0.0, |d| self.width(d.class))
    }

    /// Layout-free cell area estimate in square meters.
    ///
    /// The height is the taller of the two device columns: PUL1/PUL2 over
    /// PDL1/PDL2 with three spacings, and PUR over PDR1/PDR2 with two. The
    /// width is four gate pitches plus half of the PG and NF widths.
    pub fn area(&self) -> f64 {
        let w = |role| self.role_width(role);
        let left = w("PUL1").max(w("PUL2")) + w("PDL1").max(w("PDL2")) + 3.0 * CELL_SPACING;
        let right = w("PUR") + w("PDR1").max(w("PDR2")) + 2.0 * CELL_SPACING;
        let width = 4.0 * (self.length + CELL_SPACING) + 0.5 * (w("PG") + w("NF"));
        left.max(right) * width
    }

    pub fn with_variant(&self, row: usize, col: usize) -> Self {
        Self {
            variant: Some((row, col)),
            ..self.clone()
        }
    }
}

/// The symbolic width parameter swept for `class`.
pub fn width_param_name(class: DeviceClass) -> &'static str {
    match class {
        DeviceClass::PullDown => "nmos_width_pd",
        DeviceClass::PullUp => "pmos_width_pu",
        DeviceClass::PassGate => "nmos_width_pg",
    }
}

pub const LENGTH_PARAM_NAME: &str = "length";

pub fn bitcell_name(variant: Option<(usize, usize)>, disconnect: bool) -> ArcStr {
    let mut name = BITCELL_NAME.to_string();
    if let Some((row, col)) = variant {
        name.push_str(&format!("_{row}_{col}"));
    }
    if disconnect {
        name.push_str("_DISCONNECT");
    }
    name.into()
}

impl Component for Bitcell {
    type Params = BitcellParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        bitcell_name(self.params.variant, self.params.disconnect)
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}
