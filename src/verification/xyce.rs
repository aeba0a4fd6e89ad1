use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::paths::{out_log, out_stderr, out_stdout};

pub const DEFAULT_ENGINE: &str = "Xyce";

#[derive(Debug, Clone)]
pub struct XyceParams {
    /// Simulator executable, looked up on `PATH` when not absolute.
    pub engine: PathBuf,
    pub netlist: PathBuf,
    /// Wall-clock limit after which the simulator is killed.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct XyceGeneratedPaths {
    pub log_path: PathBuf,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

impl XyceParams {
    pub fn new(netlist: impl Into<PathBuf>) -> Self {
        Self {
            engine: PathBuf::from(DEFAULT_ENGINE),
            netlist: netlist.into(),
            timeout: None,
        }
    }

    pub fn engine(mut self, engine: impl Into<PathBuf>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn generate_paths(netlist: impl AsRef<Path>) -> XyceGeneratedPaths {
    let netlist = netlist.as_ref();
    XyceGeneratedPaths {
        log_path: out_log(netlist),
        stdout_path: out_stdout(netlist),
        stderr_path: out_stderr(netlist),
    }
}

/// Runs `<engine> <netlist> -o <netlist>` in the netlist's directory.
///
/// Output files land next to the netlist. A nonzero exit status or an
/// expired timeout is an [`Error::Simulation`] pointing at the simulator log.
pub fn run_xyce(params: &XyceParams) -> Result<XyceGeneratedPaths> {
    let paths = generate_paths(&params.netlist);
    let out_file = File::create(&paths.stdout_path)?;
    let err_file = File::create(&paths.stderr_path)?;

    let mut cmd = Command::new(&params.engine);
    cmd.arg(&params.netlist)
        .arg("-o")
        .arg(&params.netlist)
        .stdout(out_file)
        .stderr(err_file);
    if let Some(dir) = params.netlist.parent().filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }

    log::info!("running {:?} on {:?}", params.engine, params.netlist);
    let mut child = cmd.spawn()?;
    let start = Instant::now();
    let outcome = loop {
        if let Some(status) = child.try_wait()? {
            break if status.success() {
                Ok(())
            } else {
                Err(status.to_string())
            };
        }
        if let Some(limit) = params.timeout.filter(|&t| start.elapsed() > t) {
            child.kill()?;
            child.wait()?;
            break Err(format!("timeout after {}s", limit.as_secs_f64()));
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    if let Err(status) = outcome {
        let stderr = std::fs::read_to_string(&paths.stderr_path).unwrap_or_default();
        return Err(Error::Simulation {
            netlist: params.netlist.clone(),
            status,
            log: paths.log_path,
            stderr,
        });
    }
    log::info!("simulation of {:?} finished", params.netlist);
    Ok(paths)
}
