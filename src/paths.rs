use std::path::{Path, PathBuf};

pub fn out_spice(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.spice"))
}

/// `mc_{op}_{rows}x{cols}_rc{0|1}{_q1}_tb.sp`
pub fn out_testbench(
    sim_dir: impl AsRef<Path>,
    operation: &str,
    num_rows: usize,
    num_cols: usize,
    rc: bool,
    q_init: bool,
) -> PathBuf {
    let init = if q_init { "_q1" } else { "" };
    PathBuf::from(sim_dir.as_ref()).join(format!(
        "mc_{operation}_{num_rows}x{num_cols}_rc{}{init}_tb.sp",
        rc as u8
    ))
}

/// Per-run measurement file written by the simulator: `{netlist}.{suffix}{run}`.
pub fn out_measurement(netlist: impl AsRef<Path>, suffix: &str, run: usize) -> PathBuf {
    append_extension(netlist, &format!("{suffix}{run}"))
}

/// Waveform print file: `{netlist}.prn`.
pub fn out_prn(netlist: impl AsRef<Path>) -> PathBuf {
    append_extension(netlist, "prn")
}

/// The simulator log: the netlist with `.sp` replaced by `.lis`.
pub fn out_log(netlist: impl AsRef<Path>) -> PathBuf {
    netlist.as_ref().with_extension("lis")
}

pub fn out_stdout(netlist: impl AsRef<Path>) -> PathBuf {
    append_extension(netlist, "stdout")
}

pub fn out_stderr(netlist: impl AsRef<Path>) -> PathBuf {
    append_extension(netlist, "stderr")
}

/// `{netlist without .sp}.data.csv`
pub fn out_data_csv(netlist: impl AsRef<Path>) -> PathBuf {
    netlist.as_ref().with_extension("data.csv")
}

/// `{netlist without .sp}.stats.csv`
pub fn out_stats_csv(netlist: impl AsRef<Path>) -> PathBuf {
    netlist.as_ref().with_extension("stats.csv")
}

/// `{netlist without .sp}.summary.json`
pub fn out_summary_json(netlist: impl AsRef<Path>) -> PathBuf {
    netlist.as_ref().with_extension("summary.json")
}

fn append_extension(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    let mut s = path.as_ref().as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testbench_paths() {
        let tb = out_testbench("sim", "read", 16, 4, true, false);
        assert_eq!(tb, PathBuf::from("sim/mc_read_16x4_rc1_tb.sp"));
        assert_eq!(
            out_testbench("sim", "hold_snm", 2, 2, false, true),
            PathBuf::from("sim/mc_hold_snm_2x2_rc0_q1_tb.sp")
        );
        assert_eq!(out_measurement(&tb, "mt", 3), PathBuf::from("sim/mc_read_16x4_rc1_tb.sp.mt3"));
        assert_eq!(out_prn(&tb), PathBuf::from("sim/mc_read_16x4_rc1_tb.sp.prn"));
        assert_eq!(out_log(&tb), PathBuf::from("sim/mc_read_16x4_rc1_tb.lis"));
        assert_eq!(out_data_csv(&tb), PathBuf::from("sim/mc_read_16x4_rc1_tb.data.csv"));
        assert_eq!(out_stats_csv(&tb), PathBuf::from("sim/mc_read_16x4_rc1_tb.stats.csv"));
        assert_eq!(out_summary_json(&tb), PathBuf::from("sim/mc_read_16x4_rc1_tb.summary.json"));
    }
}
