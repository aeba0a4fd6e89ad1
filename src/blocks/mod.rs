pub mod array;
pub mod bitcell;
pub mod colmux;
pub mod decoder;
pub mod gate;
pub mod precharge;
pub mod senseamp;
pub mod wldriver;
pub mod wrdriver;

use crate::composer::{DeviceModels, ModelChoices};
use crate::error::Result;
use crate::schematic::{NetlistCtx, SizingMode};

/// Model selection shared by the peripheral blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSelection {
    pub mode: SizingMode,
    /// Models used with fixed sizing.
    pub models: DeviceModels,
    /// Candidates indexed by the model table with symbolic sizing.
    pub choices: ModelChoices,
}

impl ModelSelection {
    pub fn new(models: DeviceModels) -> Self {
        Self {
            models,
            ..Default::default()
        }
    }

    pub fn symbolic(mut self, choices: ModelChoices) -> Self {
        self.mode = SizingMode::Symbolic;
        self.choices = choices;
        self
    }

    /// Resolves the models for a block whose model-index columns are `columns`.
    pub fn resolve(&self, ctx: &NetlistCtx, columns: &[&str]) -> Result<DeviceModels> {
        self.models
            .resolve(self.mode, &self.choices, ctx.model_index(), columns)
    }
}

/// Load count below which driver widths stop shrinking.
pub const MIN_SCALE_COUNT: usize = 8;
/// Load count at which a driver has its base width.
pub const REFERENCE_SCALE_COUNT: usize = 16;

/// The factor applied to a driver's base width when it serves `count` loads.
///
/// Non-decreasing in `count` and exactly 1 at [`REFERENCE_SCALE_COUNT`].
#[inline]
pub fn scale_factor(count: usize) -> f64 {
    count.max(MIN_SCALE_COUNT) as f64 / REFERENCE_SCALE_COUNT as f64
}

#[inline]
pub fn scale_width(base: f64, count: usize) -> f64 {
    base * scale_factor(count)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_width_scaling_is_monotonic() {
        let base = 0.27e-6;
        assert_relative_eq!(scale_width(base, REFERENCE_SCALE_COUNT), base);
        assert_relative_eq!(scale_width(base, 1), scale_width(base, MIN_SCALE_COUNT));
        let widths = (1..=256).map(|n| scale_width(base, n)).collect::<Vec<_>>();
        assert!(widths.windows(2).all(|w| w[0] <= w[1]));
        assert_relative_eq!(scale_width(base, 64), 4.0 * base);
    }
}
