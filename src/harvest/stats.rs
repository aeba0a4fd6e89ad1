use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use super::{csv_value, ResultSet};
use crate::error::Result;

/// Percentiles reported for every column.
pub const PERCENTILES: [f64; 7] = [0.01, 0.05, 0.25, 0.50, 0.75, 0.95, 0.99];

/// Summary of one measurement column over its non-missing runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation.
    pub std: f64,
    pub min: f64,
    /// Values at [`PERCENTILES`], linearly interpolated.
    pub percentiles: [f64; 7],
    pub max: f64,
    /// Coefficient of variation, `std / mean`.
    pub cv: f64,
    pub range: f64,
    /// Bias-corrected sample skewness.
    pub skew: f64,
    /// Bias-corrected excess kurtosis.
    pub kurtosis: f64,
}

impl ColumnStats {
    /// Statistics of `values`, ignoring NaN entries.
    ///
    /// Moments that need more samples than are available are NaN.
    pub fn new(name: impl Into<String>, values: &[f64]) -> Self {
        let mut v = values.iter().copied().filter(|x| !x.is_nan()).collect::<Vec<_>>();
        v.sort_by(f64::total_cmp);
        let n = v.len();
        let nf = n as f64;

        let mean = if n == 0 { f64::NAN } else { v.iter().sum::<f64>() / nf };
        let central = |k: i32| v.iter().map(|x| (x - mean).powi(k)).sum::<f64>() / nf;
        let (m2, m3, m4) = (central(2), central(3), central(4));

        let std = if n < 2 { f64::NAN } else { (m2 * nf / (nf - 1.0)).sqrt() };
        let skew = if n < 3 {
            f64::NAN
        } else if m2 == 0.0 {
            0.0
        } else {
            (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * m3 / m2.powf(1.5)
        };
        let kurtosis = if n < 4 {
            f64::NAN
        } else if m2 == 0.0 {
            0.0
        } else {
            let g2 = m4 / (m2 * m2) - 3.0;
            ((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0))
        };

        let (min, max) = match (v.first(), v.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (f64::NAN, f64::NAN),
        };

        Self {
            name: name.into(),
            count: n,
            mean,
            std,
            min,
            percentiles: PERCENTILES.map(|q| quantile(&v, q)),
            max,
            cv: std / mean,
            range: max - min,
            skew,
            kurtosis,
        }
    }

    #[inline]
    pub fn median(&self) -> f64 {
        self.percentiles[3]
    }

    fn csv_row(&self) -> String {
        let values = [self.count as f64, self.mean, self.std, self.min]
            .into_iter()
            .chain(self.percentiles)
            .chain([self.max, self.cv, self.range, self.skew, self.kurtosis])
            .map(csv_value);
        std::iter::once(self.name.clone()).chain(values).join(",")
    }
}

/// Linear interpolation between the closest ranks of sorted `v`.
fn quantile(v: &[f64], q: f64) -> f64 {
    match v.len() {
        0 => f64::NAN,
        1 => v[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            v[lo] + (v[hi] - v[lo]) * (pos - lo as f64)
        }
    }
}

/// Statistics for every column of `results`.
pub fn describe(results: &ResultSet) -> Vec<ColumnStats> {
    results
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values = results.rows.iter().map(|row| row[i]).collect::<Vec<_>>();
            ColumnStats::new(name, &values)
        })
        .collect()
}

pub fn write_stats_csv<W: Write>(stats: &[ColumnStats], out: &mut W) -> Result<()> {
    writeln!(
        out,
        ",count,mean,std,min,1%,5%,25%,50%,75%,95%,99%,max,cv,range,skew,kurtosis"
    )?;
    for s in stats {
        writeln!(out, "{}", s.csv_row())?;
    }
    Ok(())
}

pub fn save_stats_csv(stats: &[ColumnStats], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    write_stats_csv(stats, &mut out)?;
    out.flush()?;
    log::info!("saved statistics of {} columns to {path:?}", stats.len());
    Ok(())
}

/// Acceptance limit for a metric.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum YieldBound {
    /// Passing values are at most this.
    Max(f64),
    /// Passing values are at least this.
    Min(f64),
}

impl YieldBound {
    #[inline]
    pub fn passes(&self, value: f64) -> bool {
        match *self {
            YieldBound::Max(limit) => value <= limit,
            YieldBound::Min(limit) => value >= limit,
        }
    }
}

/// Parametric yield of one metric. Missing runs count as failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldReport {
    pub metric: String,
    pub bound: YieldBound,
    pub num_samples: usize,
    pub num_pass: usize,
    pub mean: f64,
    pub std: f64,
    /// The value furthest on the failing side.
    pub worst: f64,
    /// Distance from the mean to the limit in standard deviations,
    /// positive when the mean passes.
    pub sigma: f64,
}

impl YieldReport {
    pub fn new(metric: impl Into<String>, values: &[f64], bound: YieldBound) -> Self {
        let stats = ColumnStats::new("", values);
        let num_pass = values.iter().filter(|&&v| bound.passes(v)).count();
        let (worst, margin) = match bound {
            YieldBound::Max(limit) => (stats.max, limit - stats.mean),
            YieldBound::Min(limit) => (stats.min, stats.mean - limit),
        };
        Self {
            metric: metric.into(),
            bound,
            num_samples: values.len(),
            num_pass,
            mean: stats.mean,
            std: stats.std,
            worst,
            sigma: margin / stats.std,
        }
    }

    #[inline]
    pub fn pass_fraction(&self) -> f64 {
        if self.num_samples == 0 {
            0.0
        } else {
            self.num_pass as f64 / self.num_samples as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_column_stats() {
        let s = ColumnStats::new("X", &[2.0, 8.0, f64::NAN, 4.0, 1.0, 10.0]);
        assert_eq!(s.count, 5);
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.std, 15f64.sqrt());
        assert_relative_eq!(s.median(), 4.0);
        assert_relative_eq!(s.percentiles[2], 2.0);
        assert_relative_eq!(s.percentiles[0], 1.04, max_relative = 1e-12);
        assert_relative_eq!(s.range, 9.0);
        assert_relative_eq!(s.cv, s.std / 5.0);
        assert_relative_eq!(s.skew, 0.4303315, max_relative = 1e-6);
        assert_relative_eq!(s.kurtosis, -2.2, max_relative = 1e-6);
    }

    #[test]
    fn test_small_samples() {
        let s = ColumnStats::new("X", &[3.0]);
        assert_eq!(s.count, 1);
        assert_relative_eq!(s.median(), 3.0);
        assert!(s.std.is_nan());
        assert!(s.skew.is_nan());

        let s = ColumnStats::new("X", &[1.0; 4]);
        assert_relative_eq!(s.std, 0.0);
        assert_relative_eq!(s.skew, 0.0);
        assert_relative_eq!(s.kurtosis, 0.0);

        let s = ColumnStats::new("X", &[f64::NAN]);
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
    }

    #[test]
    fn test_stats_csv() -> Result<()> {
        let stats = vec![ColumnStats::new("TSWING", &[1.0, 3.0])];
        let mut out = Vec::new();
        write_stats_csv(&stats, &mut out)?;
        let text = String::from_utf8(out).expect("utf-8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("TSWING,2,2,"));
        assert!(lines[1].ends_with(",2,,"));
        Ok(())
    }

    #[test]
    fn test_yield_report() {
        let values = [0.20, 0.22, 0.18, 0.05, f64::NAN];
        let report = YieldReport::new("HOLD_SNM", &values, YieldBound::Min(0.1));
        assert_eq!(report.num_samples, 5);
        assert_eq!(report.num_pass, 3);
        assert_relative_eq!(report.pass_fraction(), 0.6);
        assert_relative_eq!(report.worst, 0.05);
        assert!(report.sigma > 0.0);

        let report = YieldReport::new("TSWING", &[1e-10, 3e-10], YieldBound::Max(2e-10));
        assert_eq!(report.num_pass, 1);
        assert_relative_eq!(report.worst, 3e-10);
        assert_relative_eq!(report.sigma, 0.0, epsilon = 1e-9);
    }
}
