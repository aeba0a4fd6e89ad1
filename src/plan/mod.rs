use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::config::SramConfig;
use crate::harvest::{harvest_and_save, ColumnStats, Harvest, YieldBound, YieldReport};
use crate::paths::out_summary_json;
use crate::testbench::{generate, Operation, TbParams};
use crate::verification::{run_xyce, XyceParams};

pub mod progress;

use progress::StepContext;

/// A concrete plan for one Monte-Carlo deck.
///
/// Has a 1-1 mapping with a netlist.
pub struct YieldPlan {
    pub params: TbParams,
    pub engine: PathBuf,
    pub timeout: Duration,
    /// Yield limits of the harvested metrics.
    pub bounds: Vec<(&'static str, YieldBound)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    GeneratePlan,
    GenerateNetlist,
    RunSimulation,
    HarvestResults,
}

impl TaskKey {
    /// Every task after plan generation.
    pub fn all() -> HashSet<TaskKey> {
        HashSet::from([
            TaskKey::GenerateNetlist,
            TaskKey::RunSimulation,
            TaskKey::HarvestResults,
        ])
    }
}

pub struct ExecutePlanParams<'a> {
    pub plan: &'a YieldPlan,
    pub tasks: &'a HashSet<TaskKey>,
    pub ctx: Option<&'a mut StepContext>,
}

/// Artifacts of an executed plan.
#[derive(Debug)]
pub struct PlanOutput {
    pub netlist: PathBuf,
    pub harvest: Option<Harvest>,
    pub yields: Vec<YieldReport>,
}

#[derive(Serialize)]
struct Summary<'a> {
    operation: Operation,
    netlist: &'a Path,
    /// Estimated bitcell area in square microns.
    cell_area_um2: f64,
    num_runs: usize,
    missing_runs: Vec<usize>,
    stats: &'a [ColumnStats],
    yields: &'a [YieldReport],
}

fn save_summary(
    tb: &TbParams,
    netlist: &Path,
    harvest: &Harvest,
    yields: &[YieldReport],
) -> Result<PathBuf> {
    let path = out_summary_json(netlist);
    let summary = Summary {
        operation: tb.operation,
        netlist,
        cell_area_um2: tb.cell_params().area() * 1e12,
        num_runs: harvest.results.num_runs(),
        missing_runs: harvest.results.missing_runs(),
        stats: &harvest.stats,
        yields,
    };
    let out = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(out, &summary)?;
    log::info!("saved summary to {path:?}");
    Ok(path)
}

pub fn generate_plan(config: &SramConfig, op: Operation) -> Result<YieldPlan> {
    let g = &config.global;
    let tb = &config.testbench;

    if g.num_rows < 2 || g.num_cols < 1 {
        bail!("The array must have at least 2 rows and 1 column");
    }
    if tb.mux_in == 0 || g.num_cols % tb.mux_in != 0 {
        bail!("The number of columns must be a multiple of the column mux ratio");
    }
    if g.monte_carlo_runs == 0 {
        bail!("At least one Monte-Carlo run is required");
    }
    if g.timeout == 0 {
        bail!("The simulation timeout must be positive");
    }

    let params = config
        .testbench_params(op)
        .with_context(|| format!("invalid {op} testbench configuration"))?;
    log::info!(
        "estimated 9T bitcell area: {:.4} um^2",
        params.cell_params().area() * 1e12
    );

    Ok(YieldPlan {
        params,
        engine: tb.engine.clone(),
        timeout: Duration::from_secs(g.timeout),
        bounds: config.bounds(op),
    })
}

macro_rules! try_finish_task {
    ( $ctx:expr, $task:expr ) => {
        if let Some(ctx) = $ctx.as_mut() {
            ctx.finish($task);
        }
    };
}

macro_rules! try_check {
    ( $ctx:expr, $res:expr ) => {
        match $ctx.as_mut() {
            Some(ctx) => ctx.check($res)?,
            None => $res?,
        }
    };
}

/// Writes the deck, runs the simulator and harvests its measurements.
///
/// The netlist is always generated; simulation and harvesting run when
/// their keys are in `tasks`.
pub fn execute_plan(params: ExecutePlanParams) -> Result<PlanOutput> {
    let ExecutePlanParams {
        plan,
        tasks,
        mut ctx,
    } = params;
    let tb = &plan.params;

    let netlist = try_check!(
        ctx,
        generate(tb)
            .and_then(|deck| deck.write())
            .with_context(|| format!("failed to generate the {} deck", tb.operation))
    );
    log::info!("wrote {} deck to {netlist:?}", tb.operation);
    try_finish_task!(ctx, TaskKey::GenerateNetlist);

    if tasks.contains(&TaskKey::RunSimulation) {
        let xyce = XyceParams::new(&netlist)
            .engine(&plan.engine)
            .timeout(plan.timeout);
        try_check!(
            ctx,
            run_xyce(&xyce).with_context(|| format!("simulation of {netlist:?} failed"))
        );
        try_finish_task!(ctx, TaskKey::RunSimulation);
    }

    let mut output = PlanOutput {
        netlist,
        harvest: None,
        yields: Vec::new(),
    };
    if tasks.contains(&TaskKey::HarvestResults) {
        let harvest = try_check!(
            ctx,
            harvest_and_save(&output.netlist, tb.operation, tb.num_runs())
                .with_context(|| format!("failed to harvest results of {:?}", output.netlist))
        );
        output.yields = plan
            .bounds
            .iter()
            .filter_map(|&(metric, bound)| {
                let values = harvest.results.column(metric)?;
                Some(YieldReport::new(metric, &values, bound))
            })
            .collect();
        for y in &output.yields {
            log::info!(
                "{}: {}/{} runs pass ({:.2} sigma)",
                y.metric,
                y.num_pass,
                y.num_samples,
                y.sigma
            );
        }
        try_check!(
            ctx,
            save_summary(tb, &output.netlist, &harvest, &output.yields)
        );
        output.harvest = Some(harvest);
        try_finish_task!(ctx, TaskKey::HarvestResults);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::MODELS;
    use crate::paths::out_measurement;

    fn config(dir: &std::path::Path) -> Result<SramConfig> {
        let pdk = dir.join("models_TT.spice");
        std::fs::write(&pdk, MODELS)?;
        let mut cfg = SramConfig::default();
        cfg.global.num_rows = 4;
        cfg.global.num_cols = 2;
        cfg.global.monte_carlo_runs = 3;
        cfg.global.pdk_path_tt = pdk;
        cfg.testbench.sim_dir = dir.join("sim");
        cfg.metrics.insert(
            "HOLD_SNM".to_string(),
            crate::config::MetricConfig {
                upper: None,
                lower: Some(0.1),
            },
        );
        Ok(cfg)
    }

    #[test]
    fn test_generate_plan_rejects_bad_geometry() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut cfg = config(dir.path())?;
        cfg.testbench.mux_in = 4;
        assert!(generate_plan(&cfg, Operation::Read).is_err());
        cfg.testbench.mux_in = 2;
        cfg.global.monte_carlo_runs = 0;
        assert!(generate_plan(&cfg, Operation::Read).is_err());
        Ok(())
    }

    #[test]
    fn test_execute_plan_without_simulation() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = config(dir.path())?;
        let plan = generate_plan(&cfg, Operation::HoldSnm)?;
        assert_eq!(plan.bounds, [("HOLD_SNM", YieldBound::Min(0.1))]);

        let tasks = HashSet::from([TaskKey::GenerateNetlist]);
        let out = execute_plan(ExecutePlanParams {
            plan: &plan,
            tasks: &tasks,
            ctx: None,
        })?;
        assert!(out.netlist.exists());
        assert!(out.harvest.is_none());

        // Results of an earlier simulation, one run missing.
        for (run, snm) in [(0, 0.2), (2, 0.05)] {
            std::fs::write(
                out_measurement(&out.netlist, "ms", run),
                format!("MAXVD = {}\nHOLD_SNM = {snm}\n", snm * 2f64.sqrt()),
            )?;
        }
        let tasks = HashSet::from([TaskKey::GenerateNetlist, TaskKey::HarvestResults]);
        let out = execute_plan(ExecutePlanParams {
            plan: &plan,
            tasks: &tasks,
            ctx: None,
        })?;
        let harvest = out.harvest.expect("harvested results");
        assert_eq!(harvest.results.num_runs(), 3);
        assert_eq!(out.yields.len(), 1);
        assert_eq!(out.yields[0].num_pass, 1);

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out_summary_json(&out.netlist))?)?;
        assert_eq!(summary["operation"], "hold_snm");
        let area = summary["cell_area_um2"].as_f64().expect("area is a number");
        approx::assert_relative_eq!(area, 0.25365, max_relative = 1e-9);
        assert_eq!(summary["missing_runs"], serde_json::json!([1]));
        assert_eq!(summary["yields"][0]["num_pass"], 1);
        Ok(())
    }

    #[test]
    #[ignore = "requires Xyce on PATH"]
    fn test_hold_snm_yield() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = config(dir.path())?;
        let plan = generate_plan(&cfg, Operation::HoldSnm)?;
        let out = execute_plan(ExecutePlanParams {
            plan: &plan,
            tasks: &TaskKey::all(),
            ctx: None,
        })?;
        let harvest = out.harvest.expect("harvested results");
        assert!(harvest.results.column("HOLD_SNM").is_some());
        Ok(())
    }
}
