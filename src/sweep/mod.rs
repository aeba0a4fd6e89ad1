//! `.data` tables bound to netlist parameters through `.STEP data=NAME`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tera::Context;

use crate::error::{ConfigError, Result};
use crate::TEMPLATES;

/// Geometry sweep tables, one per block that supports symbolic sizing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Bitcell,
    Precharge,
    SenseAmp,
    WordlineDriver,
    ColumnMux,
    WriteDriver,
    Decoder,
}

impl SweepKind {
    pub const ALL: [SweepKind; 7] = [
        SweepKind::Bitcell,
        SweepKind::Precharge,
        SweepKind::SenseAmp,
        SweepKind::WordlineDriver,
        SweepKind::ColumnMux,
        SweepKind::WriteDriver,
        SweepKind::Decoder,
    ];

    /// The `.data` table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            SweepKind::Bitcell => "SRAM_9T_CELL",
            SweepKind::Precharge => "PRECHARGE",
            SweepKind::SenseAmp => "SENSEAMP",
            SweepKind::WordlineDriver => "WORDLINEDRIVER",
            SweepKind::ColumnMux => "COLUMNMUX",
            SweepKind::WriteDriver => "WRITEDRIVER",
            SweepKind::Decoder => "DECODER",
        }
    }

    /// The symbolic parameters the table binds.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SweepKind::Bitcell => &["pmos_width_pu", "nmos_width_pd", "nmos_width_pg", "length"],
            SweepKind::Precharge => &["pmos_width_precharge", "length_precharge"],
            SweepKind::SenseAmp => &[
                "pmos_width_senseamp",
                "nmos_width_senseamp",
                "length_senseamp",
            ],
            SweepKind::WordlineDriver => &[
                "pmos_width_wld_nandp",
                "nmos_width_wld_nandn",
                "pmos_width_wld_invp",
                "nmos_width_wld_invn",
                "length_wld",
            ],
            SweepKind::ColumnMux => &["pmos_width_mux", "nmos_width_mux", "length_mux"],
            SweepKind::WriteDriver => &["pmos_width_wrd", "nmos_width_wrd", "length_wrd"],
            SweepKind::Decoder => &[
                "pmos_width_decoder_nandp",
                "nmos_width_decoder_nandn",
                "pmos_width_decoder_invp",
                "nmos_width_decoder_invn",
                "length_decoder",
            ],
        }
    }

    pub fn file_name(&self) -> String {
        format!("param_sweep_{}.data", self.table_name())
    }
}

/// Numeric rendering of table entries.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Precision {
    /// `{:.3e}`
    Scientific,
    /// `{:.4}`
    Fixed,
}

impl Precision {
    fn format(&self, x: f64) -> String {
        match self {
            Precision::Scientific => format!("{x:.3e}"),
            Precision::Fixed => format!("{x:.4}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct DataTableContext<'a> {
    name: &'a str,
    columns: &'a [String],
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Builds a table, checking every row against the column count.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
        source: &Path,
    ) -> Result<Self> {
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(ConfigError::ColumnCountMismatch {
                file: source.to_path_buf(),
                row,
                expected: columns.len(),
                found: values.len(),
            }
            .into());
        }
        Ok(Self {
            name: name.into(),
            columns,
            rows,
        })
    }

    /// Reads the columns of `kind` from a comma-separated file with a header row.
    ///
    /// Extra columns in the file are ignored.
    pub fn from_csv(kind: SweepKind, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse_csv(kind.table_name(), kind.columns(), path, &text)
    }

    pub fn parse_csv(name: &str, columns: &[&str], path: &Path, text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let header = match lines.next() {
            Some((_, header)) => header.split(',').map(str::trim).collect::<Vec<_>>(),
            None => {
                return Err(ConfigError::MalformedTable {
                    file: path.to_path_buf(),
                    line: 1,
                    reason: "missing header row".to_string(),
                }
                .into())
            }
        };
        let indices = columns
            .iter()
            .map(|&col| {
                header
                    .iter()
                    .position(|h| *h == col)
                    .ok_or_else(|| ConfigError::MissingColumn {
                        file: path.to_path_buf(),
                        column: col.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let fields = line.split(',').map(str::trim).collect::<Vec<_>>();
            if fields.len() != header.len() {
                return Err(ConfigError::ColumnCountMismatch {
                    file: path.to_path_buf(),
                    row: rows.len(),
                    expected: header.len(),
                    found: fields.len(),
                }
                .into());
            }
            let row = indices
                .iter()
                .map(|&i| {
                    fields[i]
                        .parse::<f64>()
                        .map_err(|e| ConfigError::MalformedTable {
                            file: path.to_path_buf(),
                            line: line_no + 1,
                            reason: format!("`{}`: {e}", fields[i]),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::new(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            rows,
            path,
        )
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// `.param` declarations giving each column a placeholder value.
    pub fn param_lines(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!(".param {c}=0.0"))
            .collect()
    }

    pub fn step_line(&self) -> String {
        format!(".STEP data={}", self.name)
    }

    pub fn render(&self, precision: Precision) -> Result<String> {
        let ctx = DataTableContext {
            name: &self.name,
            columns: &self.columns,
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|&x| precision.format(x)).collect())
                .collect(),
        };
        Ok(TEMPLATES.render("data_table.data", &Context::from_serialize(ctx)?)?)
    }

    pub fn save(&self, path: impl AsRef<Path>, precision: Precision) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(precision)?)?;
        log::info!("saved data table {} to {path:?}", self.name);
        Ok(path.to_path_buf())
    }
}
