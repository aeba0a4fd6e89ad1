//! Reduction of per-run simulator measurement files.
//!
//! Every run `i` of a deck writes `{netlist}.{suffix}{i}` with one
//! `NAME = VALUE` line per `.MEASURE`. The harvester reads all expected runs
//! into a [`ResultSet`] with exactly one row per run, whether or not the
//! run's file exists.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::paths::{out_data_csv, out_measurement, out_stats_csv};
use crate::testbench::Operation;

pub mod prn;
pub mod stats;

pub use stats::{describe, ColumnStats, YieldBound, YieldReport};

/// Measurements with a smaller magnitude are treated as absent.
pub const VALUE_THRESHOLD: f64 = 1e-30;
/// Stand-in for measurements a run did not produce.
pub const MISSING: f64 = f64::NAN;

lazy_static! {
    static ref MEASUREMENT_LINE: Regex = Regex::new(r"^([^=]+?)\s*=\s*(\S+)").unwrap();
}

/// A line that looked like a measurement but could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub file: PathBuf,
    pub line: usize,
    pub text: String,
}

/// Per-run measurements of one deck.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Sorted union of the measurement names of every run.
    pub columns: Vec<String>,
    /// One row per expected run, in run order.
    pub rows: Vec<Vec<f64>>,
}

impl ResultSet {
    #[inline]
    pub fn num_runs(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    pub fn get(&self, run: usize, name: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.rows.get(run).map(|row| row[idx])
    }

    /// Runs with no value in any column.
    pub fn missing_runs(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| v.is_nan()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn write_csv<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Run,{}", self.columns.iter().join(","))?;
        for (run, row) in self.rows.iter().enumerate() {
            writeln!(out, "{run},{}", row.iter().map(|&v| csv_value(v)).join(","))?;
        }
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.write_csv(&mut out)?;
        out.flush()?;
        log::info!("saved {} runs to {path:?}", self.num_runs());
        Ok(())
    }
}

/// NaN is written as an empty field.
pub(crate) fn csv_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

enum Line {
    Skip,
    Value(String, f64),
    Invalid,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim().replace('\t', " ");
    if line.is_empty() || !line.contains('=') {
        return Line::Skip;
    }
    if ["*", "#", "//"].iter().any(|c| line.starts_with(c)) {
        return Line::Skip;
    }
    let caps = match MEASUREMENT_LINE.captures(&line) {
        Some(caps) => caps,
        None => return Line::Invalid,
    };
    let name = caps[1].trim().to_uppercase();
    match caps[2].parse::<f64>() {
        Ok(value) if value.abs() < VALUE_THRESHOLD => Line::Skip,
        Ok(value) if !name.is_empty() => Line::Value(name, value),
        _ => Line::Invalid,
    }
}

/// Parses the `NAME = VALUE` lines of one measurement file.
///
/// Keys are upper-cased; later duplicates win. Unreadable lines are
/// returned as warnings rather than failing the file.
pub fn parse_measurements(file: &Path, text: &str) -> (BTreeMap<String, f64>, Vec<ParseWarning>) {
    let mut values = BTreeMap::new();
    let mut warnings = Vec::new();
    for (i, line) in text.lines().enumerate() {
        match parse_line(line) {
            Line::Skip => {}
            Line::Value(name, value) => {
                values.insert(name, value);
            }
            Line::Invalid => warnings.push(ParseWarning {
                file: file.to_path_buf(),
                line: i + 1,
                text: line.trim().to_string(),
            }),
        }
    }
    (values, warnings)
}

/// Reads runs `0..num_runs` of `netlist`.
///
/// A missing file becomes a row of [`MISSING`] values.
pub fn harvest(netlist: impl AsRef<Path>, suffix: &str, num_runs: usize) -> Result<ResultSet> {
    let netlist = netlist.as_ref();
    let mut runs = Vec::with_capacity(num_runs);
    let mut names = BTreeSet::new();

    for run in 0..num_runs {
        let path = out_measurement(netlist, suffix, run);
        if !path.exists() {
            log::warn!("missing measurement file {path:?}");
            runs.push(BTreeMap::new());
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        let (values, warnings) = parse_measurements(&path, &text);
        for w in warnings {
            log::warn!("ignoring invalid line {} of {:?}: {}", w.line, w.file, w.text);
        }
        names.extend(values.keys().cloned());
        runs.push(values);
    }

    let columns = names.into_iter().collect::<Vec<_>>();
    let rows = runs
        .iter()
        .map(|run| {
            columns
                .iter()
                .map(|c| run.get(c).copied().unwrap_or(MISSING))
                .collect()
        })
        .collect();
    Ok(ResultSet { columns, rows })
}

/// Harvested runs of one deck together with their statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Harvest {
    pub results: ResultSet,
    pub stats: Vec<ColumnStats>,
}

impl Harvest {
    /// Values of the metrics `op` reports, in [`Operation::metrics`] order.
    pub fn metrics(&self, op: Operation) -> Vec<(&'static str, Vec<f64>)> {
        op.metrics()
            .iter()
            .map(|&m| (m, self.results.column(m).unwrap_or_else(|| vec![MISSING; self.results.num_runs()])))
            .collect()
    }
}

/// Harvests the runs of `netlist`, computes statistics and writes
/// `{base}.data.csv` and `{base}.stats.csv` next to it.
pub fn harvest_and_save(netlist: impl AsRef<Path>, op: Operation, num_runs: usize) -> Result<Harvest> {
    let netlist = netlist.as_ref();
    let results = harvest(netlist, op.measurement_suffix(), num_runs)?;
    if results.columns.is_empty() {
        return Err(Error::EmptyResults(netlist.to_path_buf()));
    }
    let stats = describe(&results);
    results.save_csv(out_data_csv(netlist))?;
    stats::save_stats_csv(&stats, out_stats_csv(netlist))?;
    Ok(Harvest { results, stats })
}
