use std::fmt::{Display, Formatter};

use crate::schematic::value::fmt_sci;

pub enum Analysis {
    Dc(DcAnalysis),
    Tran(TransientAnalysis),
}

/// A DC sweep of a source or netlist parameter.
pub struct DcAnalysis {
    source: String,
    start: f64,
    stop: f64,
    incr: f64,
}

pub struct TransientAnalysis {
    tstep: f64,
    tstop: f64,
}

impl DcAnalysis {
    #[inline]
    pub fn new(source: impl Into<String>, start: f64, stop: f64, incr: f64) -> Self {
        Self {
            source: source.into(),
            start,
            stop,
            incr,
        }
    }

    /// Sweeps `source` symmetrically across `[-limit, limit]`.
    #[inline]
    pub fn symmetric(source: impl Into<String>, limit: f64, incr: f64) -> Self {
        Self::new(source, -limit, limit, incr)
    }
}

impl TransientAnalysis {
    #[inline]
    pub fn new(tstop: f64) -> Self {
        Self {
            tstep: tstop / 100f64,
            tstop,
        }
    }

    #[inline]
    pub fn tstep(mut self, tstep: f64) -> Self {
        self.tstep = tstep;
        self
    }
}

impl Analysis {
    /// Netlist directives for this analysis, one per line.
    pub fn directives(&self) -> Vec<String> {
        match self {
            Analysis::Dc(dc) => vec![dc.to_string()],
            Analysis::Tran(tran) => vec![
                tran.to_string(),
                format!(".OPTIONS OUTPUT INITIAL_INTERVAL={}", fmt_sci(tran.tstep)),
            ],
        }
    }
}

impl Display for DcAnalysis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            ".DC {} {:.2} {:.2} {}",
            self.source, self.start, self.stop, self.incr
        )
    }
}

impl Display for TransientAnalysis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ".TRAN {} {}", fmt_sci(self.tstep), fmt_sci(self.tstop))
    }
}
