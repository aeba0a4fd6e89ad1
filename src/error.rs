use std::path::PathBuf;

use arcstr::ArcStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation of {netlist:?} exited with {status}; check the log file {log:?}\n{stderr}")]
    Simulation {
        netlist: PathBuf,
        status: String,
        log: PathBuf,
        stderr: String,
    },

    #[error("no measurements were harvested from {0:?}")]
    EmptyResults(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Violations of netlist well-formedness.
///
/// These are always detected before anything is serialized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("instance `{instance}` of `{cell}` binds {found} nets but the cell has {expected} ports")]
    PortCountMismatch {
        instance: ArcStr,
        cell: ArcStr,
        expected: usize,
        found: usize,
    },

    #[error("instance `{instance}` leaves port `{port}` unconnected")]
    UnconnectedPort { instance: ArcStr, port: ArcStr },

    #[error("instance `{instance}` connects unknown port `{port}`")]
    UnknownPort { instance: ArcStr, port: ArcStr },

    #[error("net `{net}` is used in `{cell}` but never declared")]
    UndeclaredNet { cell: ArcStr, net: ArcStr },

    #[error("duplicate port or signal `{net}` in `{cell}`")]
    DuplicateNet { cell: ArcStr, net: ArcStr },

    #[error("duplicate element name `{name}` in `{cell}`")]
    DuplicateInstance { cell: ArcStr, name: ArcStr },

    #[error("duplicate model name `{0}`")]
    DuplicateModel(ArcStr),

    #[error("subcircuit `{0}` was defined twice with different contents")]
    ConflictingSubcircuit(ArcStr),

    #[error("unknown subcircuit `{0}`")]
    UnknownSubcircuit(ArcStr),

    #[error("an RC chain on `{0}` needs at least one segment")]
    EmptyRcChain(ArcStr),

    #[error("{0} must be at least 1")]
    EmptyDimension(&'static str),
}

/// Invalid or inconsistent external inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required column `{column}` in {file:?}")]
    MissingColumn { file: PathBuf, column: String },

    #[error("malformed table {file:?} at line {line}: {reason}")]
    MalformedTable {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("table {file:?} has {found} rows, expected {expected}")]
    RowCountMismatch {
        file: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("table {file:?} row {row} has {found} values, expected {expected}")]
    ColumnCountMismatch {
        file: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("model index {index} for `{column}` is outside the {available} available choices")]
    ModelChoiceOutOfRange {
        column: String,
        index: usize,
        available: usize,
    },

    #[error("model `{0}` is not defined in the model library")]
    MissingModel(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
