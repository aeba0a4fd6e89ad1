//! TOML configuration of a yield run.
//!
//! ```toml
//! [global]
//! vdd = 1.0
//! num_rows = 16
//! num_cols = 4
//! monte_carlo_runs = 100
//! pdk_path_TT = "models/models_TT.spice"
//!
//! [testbench]
//! mux_in = 2
//! sim_dir = "sim"
//!
//! [precharge]
//! pwidth = 0.3e-6
//!
//! [metrics.TSWING]
//! upper = 2e-10
//! ```
//!
//! Every key is optional. Block tables only override the sizes and models
//! they name.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::blocks::gate::PrimitiveGateParams;
use crate::composer::{DeviceModels, ModelChoices, PiRc};
use crate::error::{ConfigError, Result};
use crate::harvest::YieldBound;
use crate::schematic::Param;
use crate::sweep::{DataTable, SweepKind};
use crate::testbench::{BlockParams, MonteCarlo, Operation, TbParams};

/// Process corner of the device model library.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Corner {
    #[default]
    TT,
    FF,
    SS,
    FS,
    SF,
}

impl Corner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TT => "TT",
            Corner::FF => "FF",
            Corner::SS => "SS",
            Corner::FS => "FS",
            Corner::SF => "SF",
        }
    }
}

impl Display for Corner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_pdk_path(corner: Corner) -> PathBuf {
    PathBuf::from(format!("tran_models/models_{corner}.spice"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub vdd: f64,
    pub temperature: f64,
    pub num_rows: usize,
    pub num_cols: usize,
    pub monte_carlo_runs: usize,
    /// Simulator time limit in seconds.
    pub timeout: u64,
    #[serde(rename = "pdk_path_TT")]
    pub pdk_path_tt: PathBuf,
    #[serde(rename = "pdk_path_FF")]
    pub pdk_path_ff: PathBuf,
    #[serde(rename = "pdk_path_SS")]
    pub pdk_path_ss: PathBuf,
    #[serde(rename = "pdk_path_FS")]
    pub pdk_path_fs: PathBuf,
    #[serde(rename = "pdk_path_SF")]
    pub pdk_path_sf: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            vdd: 1.0,
            temperature: 27.0,
            num_rows: 32,
            num_cols: 1,
            monte_carlo_runs: 1,
            timeout: 120,
            pdk_path_tt: default_pdk_path(Corner::TT),
            pdk_path_ff: default_pdk_path(Corner::FF),
            pdk_path_ss: default_pdk_path(Corner::SS),
            pdk_path_fs: default_pdk_path(Corner::FS),
            pdk_path_sf: default_pdk_path(Corner::SF),
        }
    }
}

impl GlobalConfig {
    pub fn pdk_path(&self, corner: Corner) -> &Path {
        match corner {
            Corner::TT => &self.pdk_path_tt,
            Corner::FF => &self.pdk_path_ff,
            Corner::SS => &self.pdk_path_ss,
            Corner::FS => &self.pdk_path_fs,
            Corner::SF => &self.pdk_path_sf,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MonteCarloConfig {
    #[default]
    Standard,
    /// Rows of process parameters read from `values`, or nominal values
    /// when absent.
    Custom { values: Option<PathBuf> },
    Sweep { tables: Vec<SweepTableConfig> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepTableConfig {
    pub kind: SweepKind,
    /// CSV with the kind's columns.
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestbenchConfig {
    pub corner: Corner,
    pub mux_in: usize,
    pub target_row: usize,
    pub target_col: usize,
    pub q_init: bool,
    pub rc: Option<PiRc>,
    pub write_assist: bool,
    pub vth_std: f64,
    pub sim_dir: PathBuf,
    pub model_index: Option<PathBuf>,
    /// Simulator executable.
    pub engine: PathBuf,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for TestbenchConfig {
    fn default() -> Self {
        Self {
            corner: Corner::TT,
            mux_in: 1,
            target_row: 0,
            target_col: 0,
            q_init: false,
            rc: None,
            write_assist: false,
            vth_std: 0.05,
            sim_dir: PathBuf::from("sim"),
            model_index: None,
            engine: PathBuf::from(crate::verification::xyce::DEFAULT_ENGINE),
            monte_carlo: MonteCarloConfig::Standard,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitcellConfig {
    pub pd_width: Option<f64>,
    pub pu_width: Option<f64>,
    pub pg_width: Option<f64>,
    pub length: Option<f64>,
    pub pd_nmos_model: Option<String>,
    pub pu_pmos_model: Option<String>,
    pub pg_nmos_model: Option<String>,
}

/// Sizes and models of a transistor-level peripheral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    pub nwidth: Option<f64>,
    pub pwidth: Option<f64>,
    pub length: Option<f64>,
    pub nmos_model: Option<String>,
    pub pmos_model: Option<String>,
}

/// Sizes and models of a block built from NAND and inverter gates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateBlockConfig {
    pub nand_nwidth: Option<f64>,
    pub nand_pwidth: Option<f64>,
    pub inv_nwidth: Option<f64>,
    pub inv_pwidth: Option<f64>,
    pub length: Option<f64>,
    pub nmos_model: Option<String>,
    pub pmos_model: Option<String>,
}

/// Acceptance limits of one harvested metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

impl MetricConfig {
    pub fn bound(&self) -> Option<YieldBound> {
        match (self.upper, self.lower) {
            (Some(upper), _) => Some(YieldBound::Max(upper)),
            (None, Some(lower)) => Some(YieldBound::Min(lower)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SramConfig {
    pub global: GlobalConfig,
    pub testbench: TestbenchConfig,
    pub model_choices: ModelChoices,
    pub bitcell: BitcellConfig,
    pub precharge: PeripheralConfig,
    pub write_driver: PeripheralConfig,
    pub column_mux: PeripheralConfig,
    pub sense_amp: PeripheralConfig,
    pub wordline_driver: GateBlockConfig,
    pub decoder: GateBlockConfig,
    /// Yield limits keyed by measurement name.
    pub metrics: BTreeMap<String, MetricConfig>,
}

pub fn parse_sram_config(path: impl AsRef<Path>) -> Result<SramConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    log::debug!("loaded configuration from {path:?}");
    Ok(data)
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn set_param(target: &mut Param, value: Option<f64>) {
    if let Some(v) = value {
        *target = Param::Fixed(v);
    }
}

fn models(base: &DeviceModels, nmos: &Option<String>, pmos: &Option<String>) -> DeviceModels {
    DeviceModels {
        nmos: nmos.as_deref().map(ArcStr::from).unwrap_or_else(|| base.nmos.clone()),
        pmos: pmos.as_deref().map(ArcStr::from).unwrap_or_else(|| base.pmos.clone()),
    }
}

fn gate_sizes(nand: &mut PrimitiveGateParams, inv: &mut PrimitiveGateParams, cfg: &GateBlockConfig) {
    set_param(&mut nand.nwidth, cfg.nand_nwidth);
    set_param(&mut nand.pwidth, cfg.nand_pwidth);
    set_param(&mut inv.nwidth, cfg.inv_nwidth);
    set_param(&mut inv.pwidth, cfg.inv_pwidth);
    set_param(&mut nand.length, cfg.length);
    set_param(&mut inv.length, cfg.length);
}

/// Reads a custom process table: one sample per line, comma or whitespace
/// separated; `#` starts a comment line.
pub fn read_process_values(path: impl AsRef<Path>) -> Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::MalformedTable {
                file: path.to_path_buf(),
                line: i + 1,
                reason: e.to_string(),
            })?;
        rows.push(row);
    }
    Ok(rows)
}

impl SramConfig {
    /// Block sizing with the configured overrides applied.
    pub fn block_params(&self) -> BlockParams {
        let mut blocks = BlockParams::default();

        let b = &self.bitcell;
        let cell = &mut blocks.cell;
        set(&mut cell.pd_width, &b.pd_width);
        set(&mut cell.pu_width, &b.pu_width);
        set(&mut cell.pg_width, &b.pg_width);
        set(&mut cell.length, &b.length);
        if let Some(m) = &b.pd_nmos_model {
            cell.models.pd_nmos = ArcStr::from(m.as_str());
        }
        if let Some(m) = &b.pu_pmos_model {
            cell.models.pu_pmos = ArcStr::from(m.as_str());
        }
        if let Some(m) = &b.pg_nmos_model {
            cell.models.pg_nmos = ArcStr::from(m.as_str());
        }

        let p = &self.precharge;
        if p.nwidth.is_some() {
            log::warn!("precharge has no NMOS devices; ignoring `nwidth`");
        }
        set(&mut blocks.precharge.pwidth, &p.pwidth);
        set(&mut blocks.precharge.length, &p.length);
        let sel = &mut blocks.precharge.models;
        sel.models = models(&sel.models, &p.nmos_model, &p.pmos_model);

        macro_rules! peripheral {
            ($block:ident) => {{
                let c = &self.$block;
                let params = &mut blocks.$block;
                set(&mut params.nwidth, &c.nwidth);
                set(&mut params.pwidth, &c.pwidth);
                set(&mut params.length, &c.length);
                params.models.models = models(&params.models.models, &c.nmos_model, &c.pmos_model);
            }};
        }
        peripheral!(write_driver);
        peripheral!(column_mux);
        peripheral!(sense_amp);

        let w = &self.wordline_driver;
        let wld = &mut blocks.wordline_driver;
        gate_sizes(&mut wld.nand, &mut wld.inv, w);
        wld.models = models(&wld.models, &w.nmos_model, &w.pmos_model);

        let d = &self.decoder;
        let dec = &mut blocks.decoder;
        gate_sizes(&mut dec.nand, &mut dec.inv, d);
        dec.models = models(&dec.models, &d.nmos_model, &d.pmos_model);

        blocks
    }

    pub fn monte_carlo(&self) -> Result<MonteCarlo> {
        Ok(match &self.testbench.monte_carlo {
            MonteCarloConfig::Standard => MonteCarlo::Standard,
            MonteCarloConfig::Custom { values } => MonteCarlo::Custom {
                values: values.as_ref().map(read_process_values).transpose()?,
            },
            MonteCarloConfig::Sweep { tables } => MonteCarlo::Sweep(
                tables
                    .iter()
                    .map(|t| Ok((t.kind, DataTable::from_csv(t.kind, &t.file)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// Number of simulated samples: the process or sweep table length when
    /// one is given, the configured run count otherwise.
    pub fn num_mc(&self, mc: &MonteCarlo) -> usize {
        match mc {
            MonteCarlo::Custom { values: Some(values) } => values.len(),
            MonteCarlo::Sweep(tables) => tables.first().map_or(0, |(_, t)| t.num_rows()),
            _ => self.global.monte_carlo_runs,
        }
    }

    /// Deck parameters for `op` at the configured corner.
    pub fn testbench_params(&self, op: Operation) -> Result<TbParams> {
        let g = &self.global;
        let tb = &self.testbench;
        let monte_carlo = self.monte_carlo()?;
        let mut builder = TbParams::builder();
        builder
            .operation(op)
            .num_rows(g.num_rows)
            .num_cols(g.num_cols)
            .mux_in(tb.mux_in)
            .vdd(g.vdd)
            .temperature(g.temperature)
            .target_row(tb.target_row)
            .target_col(tb.target_col)
            .q_init(tb.q_init)
            .rc(tb.rc)
            .write_assist(tb.write_assist)
            .num_mc(self.num_mc(&monte_carlo))
            .monte_carlo(monte_carlo)
            .vth_std(tb.vth_std)
            .pdk_path(g.pdk_path(tb.corner))
            .sim_dir(&tb.sim_dir)
            .model_choices(self.model_choices.clone())
            .blocks(self.block_params());
        if let Some(index) = &tb.model_index {
            builder.model_index(index);
        }
        let params = builder.build().map_err(|e| ConfigError::InvalidValue {
            field: "testbench".to_string(),
            reason: e.to_string(),
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Yield limits of the metrics `op` reports.
    pub fn bounds(&self, op: Operation) -> Vec<(&'static str, YieldBound)> {
        op.metrics()
            .iter()
            .filter_map(|&m| Some((m, self.metrics.get(m)?.bound()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[global]
vdd = 0.9
num_rows = 16
num_cols = 4
monte_carlo_runs = 20
pdk_path_SS = "models/ss.spice"

[testbench]
corner = "SS"
mux_in = 2
target_row = 5
target_col = 3
sim_dir = "out"

[testbench.rc]
res = 50.0
cap = 2e-15

[bitcell]
pu_width = 0.1e-6
pg_nmos_model = "NMOS_LVT"

[precharge]
pwidth = 0.3e-6
pmos_model = "PMOS_HVT"

[decoder]
inv_pwidth = 0.4e-6

[metrics.TSWING]
upper = 2e-10

[metrics.HOLD_SNM]
lower = 0.1
"#;

    #[test]
    fn test_defaults() -> Result<()> {
        let cfg: SramConfig = toml::from_str("")?;
        assert_eq!(cfg.global.num_rows, 32);
        assert_eq!(cfg.global.timeout, 120);
        assert_eq!(cfg.global.pdk_path(Corner::FS), Path::new("tran_models/models_FS.spice"));
        assert_eq!(cfg.testbench.monte_carlo, MonteCarloConfig::Standard);
        assert_eq!(cfg.block_params(), BlockParams::default());
        Ok(())
    }

    #[test]
    fn test_parse_sram_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sram.toml");
        fs::write(&path, CONFIG)?;
        let cfg = parse_sram_config(&path)?;
        assert_eq!(cfg.testbench.corner, Corner::SS);
        assert_eq!(cfg.global.pdk_path(Corner::SS), Path::new("models/ss.spice"));

        let blocks = cfg.block_params();
        assert_eq!(blocks.cell.pu_width, 0.1e-6);
        assert_eq!(blocks.cell.pd_width, BlockParams::default().cell.pd_width);
        assert_eq!(blocks.cell.models.pg_nmos, "NMOS_LVT");
        assert_eq!(blocks.precharge.pwidth, 0.3e-6);
        assert_eq!(blocks.precharge.models.models.pmos, "PMOS_HVT");
        assert_eq!(blocks.precharge.models.models.nmos, "NMOS_VTG");
        assert_eq!(blocks.decoder.inv.pwidth, Param::Fixed(0.4e-6));

        let p = cfg.testbench_params(Operation::Read)?;
        assert_eq!(p.vdd, 0.9);
        assert_eq!(p.num_mc, 20);
        assert_eq!(p.mux_in, 2);
        assert_eq!(p.rc.map(|rc| rc.res), Some(50.0));
        assert_eq!(p.sim_dir, PathBuf::from("out"));

        assert_eq!(cfg.bounds(Operation::Read), [("TSWING", YieldBound::Max(2e-10))]);
        assert_eq!(cfg.bounds(Operation::HoldSnm), [("HOLD_SNM", YieldBound::Min(0.1))]);
        assert!(cfg.bounds(Operation::Write).is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_geometry() -> Result<()> {
        let cfg: SramConfig = toml::from_str(
            "[global]\nnum_rows = 4\nnum_cols = 4\n[testbench]\nmux_in = 3\n",
        )?;
        assert!(cfg.testbench_params(Operation::Read).is_err());
        Ok(())
    }

    #[test]
    fn test_custom_process_values() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let values = dir.path().join("values.csv");
        fs::write(&values, "# vth0 u0\n0.41, 0.045\n0.40 0.046\n\n")?;
        let mut cfg = SramConfig::default();
        cfg.testbench.monte_carlo = MonteCarloConfig::Custom {
            values: Some(values.clone()),
        };
        let mc = cfg.monte_carlo()?;
        assert_eq!(
            mc,
            MonteCarlo::Custom {
                values: Some(vec![vec![0.41, 0.045], vec![0.40, 0.046]])
            }
        );
        assert_eq!(cfg.num_mc(&mc), 2);

        fs::write(&values, "0.41, abc\n")?;
        assert!(read_process_values(&values).is_err());
        Ok(())
    }
}
