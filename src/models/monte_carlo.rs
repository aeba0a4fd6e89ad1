//! Monte-Carlo model generation.
//!
//! Standard runs perturb the shared models with simulator-side Gaussian
//! expressions. Custom runs bind every per-device placeholder to a row of a
//! user-supplied process table.

use std::path::{Path, PathBuf};

use super::variants::VariantRegistry;
use super::{ModelLibrary, ModelValue, SENSITIVE_PARAMS};
use crate::error::{ConfigError, Result};
use crate::sweep::{DataTable, Precision};

pub const MC_MODEL_FILE: &str = "tmp_mc.spice";
pub const PROCESS_TABLE_NAME: &str = "table";

/// Replaces each sensitive parameter with `{AGAUSS(nominal, |nominal|*std, 1)}`.
pub fn gaussian_library(library: &ModelLibrary, vth_std: f64) -> ModelLibrary {
    let mut out = library.clone();
    for card in out.models_mut() {
        for (param, value) in card.params.iter_mut() {
            if !SENSITIVE_PARAMS.contains(&param.as_str()) {
                continue;
            }
            if let Some(nominal) = value.as_f64() {
                let sigma = nominal.abs() * vth_std;
                *value = ModelValue::Str(format!("{{AGAUSS({nominal}, {sigma:.5}, 1)}}"));
            }
        }
    }
    out
}

/// Writes the Gaussian version of the library at `pdk_path` into `sim_dir`.
pub fn write_mc_model_file(
    pdk_path: impl AsRef<Path>,
    sim_dir: impl AsRef<Path>,
    vth_std: f64,
) -> Result<PathBuf> {
    let library = ModelLibrary::load(pdk_path)?;
    let path = sim_dir.as_ref().join(MC_MODEL_FILE);
    gaussian_library(&library, vth_std).save(&path)?;
    Ok(path)
}

/// The process-parameter table for a custom Monte-Carlo run.
///
/// Columns are the registry's placeholders; rows are runs. When `values`
/// is `None`, every run uses the nominal model values.
pub fn process_table(
    registry: &VariantRegistry,
    library: &ModelLibrary,
    values: Option<Vec<Vec<f64>>>,
    num_mc: usize,
    source: &Path,
) -> Result<DataTable> {
    let columns = registry.placeholders();
    let rows = match values {
        Some(rows) => {
            if rows.len() != num_mc {
                return Err(ConfigError::RowCountMismatch {
                    file: source.to_path_buf(),
                    expected: num_mc,
                    found: rows.len(),
                }
                .into());
            }
            rows
        }
        None => {
            let nominal = registry.nominal_values(library)?;
            vec![nominal; num_mc]
        }
    };
    DataTable::new(PROCESS_TABLE_NAME, columns, rows, source)
}

/// Saves a process table as `mc_{operation}_table.data` in `sim_dir`.
pub fn save_process_table(table: &DataTable, sim_dir: impl AsRef<Path>, operation: &str) -> Result<PathBuf> {
    let path = sim_dir
        .as_ref()
        .join(format!("mc_{operation}_{PROCESS_TABLE_NAME}.data"));
    table.save(path, Precision::Fixed)
}
