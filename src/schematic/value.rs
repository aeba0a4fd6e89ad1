use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// A device parameter that is either a literal or a netlist parameter
/// expression bound later by a `.STEP` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Param {
    Fixed(f64),
    Symbolic(ArcStr),
}

/// Chooses between literal sizing and symbolic (swept) sizing.
///
/// Resolved once per block; generators never branch on a boolean flag.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SizingMode {
    #[default]
    Fixed,
    Symbolic,
}

impl SizingMode {
    /// Returns the literal `value` in fixed mode, or the parameter `name` in symbolic mode.
    pub fn resolve(&self, value: f64, name: &str) -> Param {
        match self {
            SizingMode::Fixed => Param::Fixed(value),
            SizingMode::Symbolic => Param::Symbolic(ArcStr::from(name)),
        }
    }

    #[inline]
    pub fn is_symbolic(&self) -> bool {
        matches!(self, SizingMode::Symbolic)
    }
}

impl Param {
    pub fn scale(&self, factor: f64) -> Self {
        match self {
            Param::Fixed(x) => Param::Fixed(x * factor),
            Param::Symbolic(expr) if factor == 1.0 => Param::Symbolic(expr.clone()),
            Param::Symbolic(expr) => Param::Symbolic(arcstr::format!("{expr}*{factor}")),
        }
    }

    pub fn fixed(&self) -> Option<f64> {
        match self {
            Param::Fixed(x) => Some(*x),
            Param::Symbolic(_) => None,
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Fixed(value)
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Fixed(x) => write!(f, "{}", fmt_sci(*x)),
            Param::Symbolic(expr) => write!(f, "'{expr}'"),
        }
    }
}

/// Formats a value with four fractional digits in scientific notation.
pub fn fmt_sci(x: f64) -> String {
    format!("{x:.4e}")
}

/// Formats a model-card value: scientific notation with three fractional
/// digits outside `[1e-3, 1e6]`, plain decimal otherwise.
pub fn fmt_model_value(x: f64) -> String {
    let abs = x.abs();
    if x != 0.0 && (abs < 1e-3 || abs > 1e6) {
        format!("{x:.3e}")
    } else {
        format!("{x}")
    }
}
