use arcstr::ArcStr;

use crate::error::{Result, StructuralError};
use crate::schematic::{Component, NetlistCtx, SchematicCtx};

use super::bitcell::BitcellParams;

pub mod schematic;

/// A `num_rows` by `num_cols` grid of 9T cells.
///
/// Cells in a column share `BL{c}`; cells in a row share `WWLA{r}`,
/// `WWLB{r}` and `WL{r}`.
pub struct SramArray {
    params: SramArrayParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SramArrayParams {
    pub num_rows: usize,
    pub num_cols: usize,
    pub cell: BitcellParams,
    /// Gives every cell its own definition and per-device model variants.
    pub per_cell_models: bool,
}

impl SramArrayParams {
    pub fn new(num_rows: usize, num_cols: usize, cell: BitcellParams) -> Self {
        Self {
            num_rows,
            num_cols,
            cell,
            per_cell_models: false,
        }
    }

    pub fn with_per_cell_models(mut self) -> Self {
        self.per_cell_models = true;
        self
    }
}

pub fn array_name(num_rows: usize, num_cols: usize) -> ArcStr {
    arcstr::format!("SRAM_9T_CORE_{num_rows}x{num_cols}")
}

/// Name of the cell instance at `(row, col)`.
pub fn cell_instance_name(row: usize, col: usize) -> ArcStr {
    arcstr::format!("{}_{row}_{col}", super::bitcell::BITCELL_NAME)
}

impl Component for SramArray {
    type Params = SramArrayParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        if params.num_rows == 0 {
            return Err(StructuralError::EmptyDimension("num_rows").into());
        }
        if params.num_cols == 0 {
            return Err(StructuralError::EmptyDimension("num_cols").into());
        }
        Ok(Self {
            params: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        array_name(self.params.num_rows, self.params.num_cols)
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}
