//! Top-level simulation decks for the 9T array.
//!
//! A deck wires the array, decoder, wordline drivers and the peripherals an
//! operation needs, then appends the Monte-Carlo setup, analysis,
//! measurement and print directives. The single-cell noise-margin decks
//! replace the transient stimulus with a rotated-coordinate DC sweep.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use derive_builder::Builder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::blocks::array::cell_instance_name;
use crate::blocks::bitcell::BitcellParams;
use crate::blocks::colmux::ColumnMuxParams;
use crate::blocks::decoder::DecoderParams;
use crate::blocks::gate::AndParams;
use crate::blocks::precharge::PrechargeParams;
use crate::blocks::senseamp::SenseAmpParams;
use crate::blocks::wldriver::WordlineDriverParams;
use crate::blocks::wrdriver::WriteDriverParams;
use crate::blocks::ModelSelection;
use crate::composer::{DeviceModels, ModelChoices, ModelIndex, PiRc};
use crate::error::{ConfigError, Result};
use crate::models::monte_carlo::{process_table, save_process_table, write_mc_model_file};
use crate::models::ModelLibrary;
use crate::paths::out_testbench;
use crate::schematic::netlist::{write_library, write_module, SpiceBackend};
use crate::schematic::{Module, NetlistCtx, SizingMode};
use crate::sweep::{DataTable, Precision, SweepKind};
use crate::TEMPLATES;

pub mod analysis;
pub mod measure;
pub mod snm;
pub mod transient;

use analysis::{Analysis, DcAnalysis, TransientAnalysis};
use measure::Measurement;

/// Hierarchy separator used by the simulator in node paths.
pub const HIER_DELIMITER: char = ':';
/// Instance name of the array in transient decks (`XARRAY`).
pub const ARRAY_INSTANCE: &str = "ARRAY";
/// Instance name of the cell in noise-margin decks (`X9T`).
pub const SNM_CELL_INSTANCE: &str = "9T";
/// Nominal temperature of the device models.
pub const TNOM: f64 = 27.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Write,
    HoldSnm,
    ReadSnm,
    WriteSnm,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::HoldSnm => "hold_snm",
            Operation::ReadSnm => "read_snm",
            Operation::WriteSnm => "write_snm",
        }
    }

    #[inline]
    pub fn is_snm(&self) -> bool {
        matches!(
            self,
            Operation::HoldSnm | Operation::ReadSnm | Operation::WriteSnm
        )
    }

    /// Suffix of the per-run measurement files (`.mt0`, `.ms0`, ...).
    pub fn measurement_suffix(&self) -> &'static str {
        if self.is_snm() {
            "ms"
        } else {
            "mt"
        }
    }

    /// The measurements consumed by yield analysis.
    pub fn metrics(&self) -> &'static [&'static str] {
        match self {
            Operation::Read => &["TSWING", "PAVG"],
            Operation::Write => &["TWRITE_Q", "PAVG"],
            Operation::HoldSnm => &["HOLD_SNM"],
            Operation::ReadSnm => &["READ_SNM"],
            Operation::WriteSnm => &["WRITE_SNM"],
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stimulus timing in seconds.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timing {
    pub rise: Decimal,
    pub fall: Decimal,
    /// Base pulse width.
    pub pulse: Decimal,
    pub period: Decimal,
    pub delay: Decimal,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            rise: Decimal::new(1, 10),
            fall: Decimal::new(1, 10),
            pulse: Decimal::new(6, 9),
            period: Decimal::new(60, 9),
            delay: Decimal::new(1, 9),
        }
    }
}

#[inline]
pub(crate) fn secs(x: Decimal) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

impl Timing {
    pub fn step(&self) -> Decimal {
        self.rise * dec!(0.1)
    }

    /// Width of the active-low precharge pulse, which starts at `delay`.
    pub fn precharge_width(&self) -> Decimal {
        self.pulse - self.delay * dec!(3)
    }

    /// When the wordline enable (and the write-assist pulse) begins.
    pub fn wordline_delay(&self) -> Decimal {
        self.pulse - self.delay
    }

    pub fn sense_delay(&self) -> Decimal {
        self.pulse + self.delay * dec!(2)
    }

    pub fn write_enable_width(&self) -> Decimal {
        self.pulse * dec!(2)
    }
}

/// How device variation enters the deck.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MonteCarlo {
    /// Simulator-side sampling of Gaussian-perturbed shared models.
    #[default]
    Standard,
    /// Per-device model variants bound to rows of a process-parameter
    /// table. `None` runs every row at the nominal values.
    Custom { values: Option<Vec<Vec<f64>>> },
    /// Geometry sweeps of the listed blocks.
    Sweep(Vec<(SweepKind, DataTable)>),
}

impl MonteCarlo {
    #[inline]
    pub fn is_custom(&self) -> bool {
        matches!(self, MonteCarlo::Custom { .. })
    }

    pub fn sweeps(&self, kind: SweepKind) -> bool {
        match self {
            MonteCarlo::Sweep(tables) => tables.iter().any(|(k, _)| *k == kind),
            _ => false,
        }
    }
}

/// Sizing and models of every block a deck may instantiate.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockParams {
    pub cell: BitcellParams,
    pub precharge: PrechargeParams,
    pub write_driver: WriteDriverParams,
    pub column_mux: ColumnMuxParams,
    pub sense_amp: SenseAmpParams,
    pub wordline_driver: WordlineDriverParams,
    pub decoder: AndParams,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            cell: BitcellParams::default(),
            precharge: PrechargeParams::default(),
            write_driver: WriteDriverParams::default(),
            column_mux: ColumnMuxParams::new(1),
            sense_amp: SenseAmpParams::default(),
            wordline_driver: WordlineDriverParams::new(1),
            decoder: AndParams::new(DeviceModels::default()),
        }
    }
}

#[derive(Debug, Clone, Builder)]
#[builder(derive(Debug))]
pub struct TbParams {
    pub operation: Operation,
    pub num_rows: usize,
    pub num_cols: usize,
    /// Columns sharing one sense amplifier.
    #[builder(default = "1")]
    pub mux_in: usize,
    /// Supply voltage.
    #[builder(default = "1.0")]
    pub vdd: f64,
    #[builder(default = "27.0")]
    pub temperature: f64,
    #[builder(default)]
    pub target_row: usize,
    #[builder(default)]
    pub target_col: usize,
    /// Initial value stored in the target cell.
    #[builder(default)]
    pub q_init: bool,
    #[builder(default)]
    pub rc: Option<PiRc>,
    /// Pulls the target row's `WWLB` below ground during a write.
    #[builder(default)]
    pub write_assist: bool,
    #[builder(default)]
    pub timing: Timing,
    #[builder(default)]
    pub monte_carlo: MonteCarlo,
    /// Monte-Carlo samples, or rows of the process table.
    #[builder(default = "1")]
    pub num_mc: usize,
    /// Relative sigma of the sampled model parameters.
    #[builder(default = "0.05")]
    pub vth_std: f64,
    /// Device model library of the simulated corner.
    #[builder(setter(into))]
    pub pdk_path: PathBuf,
    #[builder(setter(into))]
    pub sim_dir: PathBuf,
    /// Model-index table used by symbolically sized peripherals.
    #[builder(default, setter(strip_option, into))]
    pub model_index: Option<PathBuf>,
    #[builder(default)]
    pub model_choices: ModelChoices,
    #[builder(default)]
    pub blocks: BlockParams,
}

impl TbParams {
    #[inline]
    pub fn builder() -> TbParamsBuilder {
        TbParamsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: String| -> Result<()> {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason,
            }
            .into())
        };
        if self.num_rows == 0 || self.num_cols == 0 {
            return invalid(
                "num_rows/num_cols",
                format!("array must be non-empty, got {}x{}", self.num_rows, self.num_cols),
            );
        }
        if self.target_row >= self.num_rows || self.target_col >= self.num_cols {
            return invalid(
                "target",
                format!(
                    "cell ({}, {}) is outside the {}x{} array",
                    self.target_row, self.target_col, self.num_rows, self.num_cols
                ),
            );
        }
        if self.mux_in == 0 || self.num_cols % self.mux_in != 0 {
            return invalid(
                "mux_in",
                format!("{} columns cannot be split into groups of {}", self.num_cols, self.mux_in),
            );
        }
        if self.num_mc == 0 {
            return invalid("num_mc", "at least one run is required".to_string());
        }
        if let MonteCarlo::Sweep(tables) = &self.monte_carlo {
            if let Some((kind, _)) = tables.iter().find(|(_, t)| t.num_rows() == 0) {
                return invalid(kind.table_name(), "sweep table has no rows".to_string());
            }
        }
        Ok(())
    }

    #[inline]
    pub fn half_vdd(&self) -> f64 {
        self.vdd / 2.0
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_cols / self.mux_in
    }

    /// Sense amplifier group of the target column.
    #[inline]
    pub fn target_group(&self) -> usize {
        self.target_col / self.mux_in
    }

    /// The value a write stores: the complement of the initial value.
    #[inline]
    pub fn write_value(&self) -> bool {
        !self.q_init
    }

    /// Number of simulator runs the deck produces.
    pub fn num_runs(&self) -> usize {
        match &self.monte_carlo {
            MonteCarlo::Sweep(tables) => tables.iter().map(|(_, t)| t.num_rows()).product(),
            _ => self.num_mc,
        }
    }

    pub fn netlist_path(&self) -> PathBuf {
        out_testbench(
            &self.sim_dir,
            self.operation.as_str(),
            self.num_rows,
            self.num_cols,
            self.rc.is_some(),
            self.q_init,
        )
    }

    /// Hierarchical path of a storage node of the target cell.
    pub fn cell_node(&self, node: &str) -> String {
        if self.operation.is_snm() {
            format!("X{SNM_CELL_INSTANCE}{HIER_DELIMITER}{node}")
        } else {
            format!(
                "X{ARRAY_INSTANCE}{HIER_DELIMITER}X{}{HIER_DELIMITER}{node}",
                cell_instance_name(self.target_row, self.target_col)
            )
        }
    }

    fn sizing(&self, kind: SweepKind) -> SizingMode {
        if self.monte_carlo.sweeps(kind) {
            SizingMode::Symbolic
        } else {
            SizingMode::Fixed
        }
    }

    fn selection(&self, models: &ModelSelection, kind: SweepKind) -> ModelSelection {
        match self.sizing(kind) {
            SizingMode::Symbolic => models.clone().symbolic(self.model_choices.clone()),
            SizingMode::Fixed => models.clone(),
        }
    }

    pub(crate) fn cell_params(&self) -> BitcellParams {
        BitcellParams {
            mode: self.sizing(SweepKind::Bitcell),
            rc: self.rc,
            ..self.blocks.cell.clone()
        }
    }

    pub(crate) fn precharge_params(&self) -> PrechargeParams {
        PrechargeParams {
            num_rows: self.num_rows,
            rc: self.rc,
            models: self.selection(&self.blocks.precharge.models, SweepKind::Precharge),
            ..self.blocks.precharge.clone()
        }
    }

    pub(crate) fn write_driver_params(&self) -> WriteDriverParams {
        WriteDriverParams {
            num_rows: self.num_rows,
            rc: self.rc,
            models: self.selection(&self.blocks.write_driver.models, SweepKind::WriteDriver),
            ..self.blocks.write_driver.clone()
        }
    }

    pub(crate) fn column_mux_params(&self) -> ColumnMuxParams {
        ColumnMuxParams {
            num_in: self.mux_in,
            rc: self.rc,
            models: self.selection(&self.blocks.column_mux.models, SweepKind::ColumnMux),
            ..self.blocks.column_mux.clone()
        }
    }

    pub(crate) fn sense_amp_params(&self) -> SenseAmpParams {
        SenseAmpParams {
            rc: self.rc,
            models: self.selection(&self.blocks.sense_amp.models, SweepKind::SenseAmp),
            ..self.blocks.sense_amp.clone()
        }
    }

    pub(crate) fn wordline_driver_params(&self) -> WordlineDriverParams {
        WordlineDriverParams {
            num_cols: self.num_cols,
            mode: self.sizing(SweepKind::WordlineDriver),
            rc: self.rc,
            ..self.blocks.wordline_driver.clone()
        }
    }

    pub(crate) fn decoder_params(&self) -> DecoderParams {
        DecoderParams {
            num_rows: self.num_rows,
            gates: self.blocks.decoder.clone(),
        }
        .with_rc(self.rc)
        .resolve(self.sizing(SweepKind::Decoder))
    }
}

/// Everything a deck adds around its circuit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directives {
    pub includes: Vec<PathBuf>,
    /// `name=value` parameter declarations.
    pub params: Vec<String>,
    pub initial_conditions: Vec<(String, f64)>,
    pub analysis: Vec<String>,
    /// `.STEP` / `.SAMPLING` statements.
    pub steps: Vec<String>,
    pub measurements: Vec<Measurement>,
    pub prints: Vec<String>,
}

/// A fully elaborated deck.
pub struct Testbench {
    pub params: TbParams,
    pub lib: NetlistCtx,
    pub top: Module,
    pub directives: Directives,
}

#[derive(Serialize)]
struct HeaderContext<'a> {
    title: &'a str,
    temperature: f64,
    tnom: f64,
    includes: Vec<String>,
    params: &'a [String],
}

/// Elaborates the deck described by `params` and writes its include files
/// (Monte-Carlo models, process or sweep tables) into the simulation directory.
pub fn generate(params: &TbParams) -> Result<Testbench> {
    params.validate()?;
    std::fs::create_dir_all(&params.sim_dir)?;

    let mut lib = match &params.model_index {
        Some(path) => NetlistCtx::with_model_index(Arc::new(ModelIndex::load(path)?)),
        None => NetlistCtx::new(),
    };
    let top = lib.top(&deck_name(params), |ctx| {
        if params.operation.is_snm() {
            snm::build(params, ctx)
        } else {
            transient::build(params, ctx)
        }
    })?;

    let mut directives = Directives::default();
    add_variation(params, &lib, &mut directives)?;
    if params.operation.is_snm() {
        let limit = params.vdd / 2f64.sqrt();
        directives.params.push(format!("{}=0", snm::SWEEP_PARAM));
        directives.initial_conditions.push(("BL".to_string(), params.vdd));
        directives.analysis = Analysis::Dc(DcAnalysis::symmetric(snm::SWEEP_PARAM, limit, 0.001)).directives();
        directives.measurements = measure::snm_measurements(params.operation);
    } else {
        for col in 0..params.num_cols {
            directives.initial_conditions.push((format!("BL{col}"), 0.0));
            directives.initial_conditions.push((format!("BLB{col}"), 0.0));
        }
        let (q, qb) = if params.q_init { (params.vdd, 0.0) } else { (0.0, params.vdd) };
        directives.initial_conditions.push((params.cell_node("Q"), q));
        directives.initial_conditions.push((params.cell_node("QB"), qb));
        let timing = &params.timing;
        directives.analysis = Analysis::Tran(
            TransientAnalysis::new(secs(timing.period)).tstep(secs(timing.step())),
        )
        .directives();
        directives.measurements = match params.operation {
            Operation::Read => measure::read_measurements(params),
            _ => measure::write_measurements(params),
        };
    }
    directives.prints = measure::print_lines(params);

    log::info!(
        "generated {} deck with {} subcircuits",
        params.operation,
        lib.modules().len()
    );
    Ok(Testbench {
        params: params.clone(),
        lib,
        top,
        directives,
    })
}

fn deck_name(params: &TbParams) -> String {
    format!(
        "SRAM_9T_CORE_{}x{}_MC_TB",
        params.num_rows, params.num_cols
    )
}

/// Model includes and the `.STEP`/`.SAMPLING` setup of each variation mode.
fn add_variation(params: &TbParams, lib: &NetlistCtx, directives: &mut Directives) -> Result<()> {
    let sim_dir = &params.sim_dir;
    match &params.monte_carlo {
        MonteCarlo::Standard => {
            let models = write_mc_model_file(&params.pdk_path, sim_dir, params.vth_std)?;
            directives.includes.push(models);
            directives.steps.push(".SAMPLING useExpr=true".to_string());
            directives
                .steps
                .push(format!(".options samples numsamples={}", params.num_mc));
        }
        MonteCarlo::Custom { values } => {
            let library = ModelLibrary::load(&params.pdk_path)?;
            directives.includes.push(params.pdk_path.clone());

            let variants = ModelLibrary::new(lib.variants().model_cards(&library)?);
            let variant_path = sim_dir.join(format!("mc_{}_variants.spice", params.operation));
            variants.save(&variant_path)?;
            directives.includes.push(variant_path);

            let source = sim_dir.join(format!("mc_{}_table.data", params.operation));
            let table = process_table(lib.variants(), &library, values.clone(), params.num_mc, &source)?;
            let table_path = save_process_table(&table, sim_dir, params.operation.as_str())?;
            directives.params.extend(param_decls(&table));
            directives.includes.push(table_path);
            directives.steps.push(table.step_line());
        }
        MonteCarlo::Sweep(tables) => {
            directives.includes.push(params.pdk_path.clone());
            for (kind, table) in tables {
                let path = table.save(sim_dir.join(kind.file_name()), Precision::Scientific)?;
                directives.params.extend(param_decls(table));
                directives.includes.push(path);
                directives.steps.push(table.step_line());
            }
        }
    }
    Ok(())
}

fn param_decls(table: &DataTable) -> Vec<String> {
    table.columns.iter().map(|c| format!("{c}=0.0")).collect()
}

impl Testbench {
    pub fn render(&self) -> Result<String> {
        let d = &self.directives;
        let header = HeaderContext {
            title: self.top.name.as_str(),
            temperature: self.params.temperature,
            tnom: TNOM,
            includes: d.includes.iter().map(|p| p.display().to_string()).collect(),
            params: &d.params,
        };
        let mut text = TEMPLATES.render("testbench_header.sp", &Context::from_serialize(header)?)?;

        let mut backend = SpiceBackend::new(Vec::new());
        write_library(&mut backend, &self.lib)?;
        backend.blank()?;
        write_module(&mut backend, &self.top, true)?;
        backend.blank()?;
        for (node, value) in d.initial_conditions.iter() {
            backend.raw(&format!(".IC V({node})={value:.4}"))?;
        }
        for line in d.analysis.iter().chain(d.steps.iter()) {
            backend.raw(line)?;
        }
        for m in d.measurements.iter() {
            backend.raw(&m.to_string())?;
        }
        for line in d.prints.iter() {
            backend.raw(line)?;
        }
        backend.end()?;
        text.push_str(&String::from_utf8_lossy(&backend.into_inner()));
        Ok(text)
    }

    /// Writes the deck to [`TbParams::netlist_path`].
    pub fn write(&self) -> Result<PathBuf> {
        let path = self.params.netlist_path();
        self.write_to(&path)?;
        Ok(path)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = self.render()?;
        log::debug!("deck {path:?}:\n{text}");
        let mut file = File::create(path)?;
        file.write_all(text.as_bytes())?;
        log::info!("wrote testbench to {path:?}");
        Ok(())
    }

    /// Run count expected by the harvester.
    #[inline]
    pub fn num_runs(&self) -> usize {
        self.params.num_runs()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use arcstr::ArcStr;

    use super::*;
    use crate::models::tests::MODELS;

    fn instance_cells(top: &Module) -> Vec<(ArcStr, ArcStr)> {
        top.instances()
            .map(|i| (i.name.clone(), i.cell.clone()))
            .collect()
    }

    pub(crate) fn params(dir: &Path, op: Operation) -> TbParamsBuilder {
        let pdk = dir.join("models_TT.spice");
        std::fs::write(&pdk, MODELS).expect("write model library");
        let mut builder = TbParams::builder();
        builder
            .operation(op)
            .num_rows(16)
            .num_cols(4)
            .mux_in(2)
            .target_row(5)
            .target_col(3)
            .pdk_path(pdk)
            .sim_dir(dir.join("sim"));
        builder
    }

    #[test]
    fn test_timing_defaults() {
        let t = Timing::default();
        approx::assert_relative_eq!(secs(t.step()), 1e-11);
        approx::assert_relative_eq!(secs(t.wordline_delay()), 5e-9);
        approx::assert_relative_eq!(secs(t.precharge_width()), 3e-9);
        approx::assert_relative_eq!(secs(t.write_enable_width()), 12e-9);
        assert_eq!(t.step(), Decimal::new(1, 11));
    }

    #[test]
    fn test_validate() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = params(dir.path(), Operation::Read)
            .mux_in(3)
            .build()
            .expect("valid builder");
        assert!(p.validate().is_err());
        let p = params(dir.path(), Operation::Read)
            .target_row(16)
            .build()
            .expect("valid builder");
        assert!(p.validate().is_err());
        let p = params(dir.path(), Operation::Read).build().expect("valid builder");
        p.validate()?;
        assert_eq!(p.num_groups(), 2);
        assert_eq!(p.target_group(), 1);
        assert_eq!(p.cell_node("Q"), "XARRAY:XSRAM_9T_CELL_5_3:Q");
        Ok(())
    }

    #[test]
    fn test_read_deck() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = params(dir.path(), Operation::Read)
            .num_mc(10)
            .build()
            .expect("valid builder");
        let tb = generate(&p)?;
        let path = tb.write()?;
        assert_eq!(path, dir.path().join("sim/mc_read_16x4_rc0_tb.sp"));
        let text = std::fs::read_to_string(&path)?;
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "* SRAM_9T_CORE_16x4_MC_TB");
        let mc_models = dir.path().join("sim").join("tmp_mc.spice");
        assert!(lines.contains(&format!(".include {}", mc_models.display()).as_str()));
        assert!(lines.contains(&".SAMPLING useExpr=true"));
        assert!(lines.contains(&".options samples numsamples=10"));
        assert!(lines.contains(&".subckt SRAM_9T_CORE_16x4 VDD VSS BL0 BL1 BL2 BL3 WWLA0 WWLA1 WWLA2 WWLA3 WWLA4 WWLA5 WWLA6 WWLA7 WWLA8 WWLA9 WWLA10 WWLA11 WWLA12 WWLA13 WWLA14 WWLA15 WWLB0 WWLB1 WWLB2 WWLB3 WWLB4 WWLB5 WWLB6 WWLB7 WWLB8 WWLB9 WWLB10 WWLB11 WWLB12 WWLB13 WWLB14 WWLB15 WL0 WL1 WL2 WL3 WL4 WL5 WL6 WL7 WL8 WL9 WL10 WL11 WL12 WL13 WL14 WL15"));
        assert!(lines.contains(&".IC V(XARRAY:XSRAM_9T_CELL_5_3:Q)=0.0000"));
        assert!(lines.contains(&".IC V(XARRAY:XSRAM_9T_CELL_5_3:QB)=1.0000"));
        assert!(lines.contains(&".IC V(BLB2)=0.0000"));
        assert!(lines.contains(&".TRAN 1.0000e-11 6.0000e-8"));
        assert!(lines.iter().any(|l| l.starts_with(".MEASURE TRAN TSWING PARAM='TBL-TWL'")));
        assert!(lines.iter().any(|l| l.starts_with(".MEASURE TRAN TSA TRIG V(SAE)")
            && l.contains("V(SA_Q1)")));
        assert_eq!(lines.last(), Some(&".end"));

        // Row 5 = 0b0101: each address bit steps from its complement to the target.
        for (bit, from, to) in [(0, 0, 1), (1, 1, 0), (2, 0, 1), (3, 1, 0)] {
            let prefix = format!("VA{bit} A{bit} 0 PULSE({from} {to} ");
            assert!(lines.iter().any(|l| l.starts_with(&prefix)), "missing {prefix}");
        }
        assert!(lines
            .iter()
            .any(|l| l.starts_with(".MEASURE TRAN TDECODER TRIG V(A0)=0.5000 RISE=1 ")));

        let cells = instance_cells(&tb.top);
        assert!(cells.contains(&(arcstr::literal!("MUX1"), arcstr::literal!("COLUMNMUX2"))));
        assert!(cells.contains(&(arcstr::literal!("SA0"), arcstr::literal!("SENSEAMP"))));
        assert!(cells.contains(&(arcstr::literal!("PRCH3"), arcstr::literal!("PRECHARGE"))));
        assert!(cells.contains(&(arcstr::literal!("WLD15"), arcstr::literal!("WORDLINEDRIVER"))));
        assert!(cells.contains(&(arcstr::literal!("DEC"), arcstr::literal!("DECODER_CASCADE_16"))));
        Ok(())
    }

    #[test]
    fn test_custom_write_deck() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = params(dir.path(), Operation::Write)
            .num_rows(2)
            .num_cols(2)
            .mux_in(1)
            .target_row(1)
            .target_col(0)
            .num_mc(3)
            .q_init(true)
            .monte_carlo(MonteCarlo::Custom { values: None })
            .build()
            .expect("valid builder");
        let tb = generate(&p)?;
        let path = tb.write()?;
        assert_eq!(path, dir.path().join("sim/mc_write_2x2_rc0_q1_tb.sp"));
        let text = std::fs::read_to_string(&path)?;

        // Every device of the 2x2 array has its own model card.
        assert_eq!(tb.lib.variants().len(), 2 * 2 * 9);
        let table = std::fs::read_to_string(dir.path().join("sim/mc_write_table.data"))?;
        let header = table.lines().nth(1).expect("table header");
        assert_eq!(header.split_whitespace().count(), 1 + 2 * 2 * 9 * 3);
        assert_eq!(table.lines().filter(|l| l.starts_with("+ 0.4106")).count(), 3);
        assert!(text.contains(".STEP data=table\n"));
        assert!(text.contains(".param vth0_NMOS_VTG_PG_0_0=0.0\n"));
        assert!(!text.contains(".SAMPLING"));

        let variants = std::fs::read_to_string(dir.path().join("sim/mc_write_variants.spice"))?;
        assert!(variants.contains(".model  PMOS_VTG_PUR_1_1  pmos"));

        // Writing a zero into a cell holding one.
        assert!(text.contains("TARG V(XARRAY:XSRAM_9T_CELL_1_0:Q)=0.1000 FALL=1"));
        assert!(text.contains("TARG V(BLB0)=0.5000 RISE=1"));
        Ok(())
    }

    #[test]
    fn test_sweep_deck() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let index = dir.path().join("model_index.txt");
        std::fs::write(&index, "pmos_model_senseamp nmos_model_senseamp\n0 0\n")?;
        let table = DataTable::new(
            SweepKind::SenseAmp.table_name(),
            SweepKind::SenseAmp.columns().iter().map(|c| c.to_string()).collect(),
            vec![vec![0.54e-6, 0.27e-6, 50e-9], vec![0.6e-6, 0.3e-6, 50e-9]],
            Path::new("senseamp.csv"),
        )?;
        let p = params(dir.path(), Operation::Read)
            .model_index(index)
            .monte_carlo(MonteCarlo::Sweep(vec![(SweepKind::SenseAmp, table)]))
            .build()
            .expect("valid builder");
        assert_eq!(p.num_runs(), 2);
        let text = generate(&p)?.render()?;
        assert!(text.contains(".STEP data=SENSEAMP\n"));
        assert!(text.contains(".param length_senseamp=0.0\n"));
        assert!(text.contains("W='nmos_width_senseamp'"));
        assert!(dir.path().join("sim/param_sweep_SENSEAMP.data").exists());
        Ok(())
    }

    #[test]
    fn test_hold_snm_deck() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = params(dir.path(), Operation::HoldSnm)
            .monte_carlo(MonteCarlo::Custom { values: None })
            .num_mc(2)
            .build()
            .expect("valid builder");
        let tb = generate(&p)?;
        let path = tb.write()?;
        assert_eq!(path, dir.path().join("sim/mc_hold_snm_16x4_rc0_tb.sp"));
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains(".param U=0\n"));
        assert!(text.contains(".DC U -0.71 0.71 0.001\n"));
        assert!(text.contains("EV1 V1 0 VOL='U+sqrt(2)*V(X9T:QBD)'\n"));
        assert!(text.contains("EQ X9T:Q 0 VOL='1/sqrt(2)*U+1/sqrt(2)*V(V1)'\n"));
        assert!(text.contains(".MEASURE DC MAXVD MAX V(VD)\n"));
        assert!(text.contains(".MEASURE DC HOLD_SNM PARAM='1/sqrt(2)*MAXVD'\n"));
        assert!(text.contains("X9T VDD VSS BL WWLA WWLB WL SRAM_9T_CELL_0_0_DISCONNECT\n"));
        // Only the measured cell is varied.
        assert_eq!(tb.lib.variants().len(), 9);
        Ok(())
    }
}
