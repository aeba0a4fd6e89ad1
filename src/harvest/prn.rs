//! Reader for the simulator's columnar `.prn` waveform output.
//!
//! A stepped or sampled run concatenates the waveforms of every sample in
//! one file; [`PrnData::split_blocks`] cuts them apart again.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

const INDEX_COLUMN: &str = "INDEX";
const TIME_COLUMN: &str = "TIME";
/// Tolerance for detecting a restart of the time axis.
const TIME_EPS: f64 = 1e-12;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrnKind {
    Tran,
    Dc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrnData {
    pub kind: PrnKind,
    /// Column names without the leading index column.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

fn malformed(file: &Path, line: usize, reason: impl Into<String>) -> ConfigError {
    ConfigError::MalformedTable {
        file: file.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

impl PrnData {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &text)?)
    }

    /// Parses `.prn` text. The first non-empty line is the header and must
    /// start with `Index`; the second column selects the analysis kind.
    pub fn parse(file: impl Into<PathBuf>, text: &str) -> Result<Self, ConfigError> {
        let file = file.into();
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (header_line, header) = lines
            .next()
            .ok_or_else(|| malformed(&file, 1, "file is empty"))?;
        let header = header.split_whitespace().collect::<Vec<_>>();
        if header.len() < 2 {
            return Err(malformed(&file, header_line, "header needs at least two columns"));
        }
        if !header[0].eq_ignore_ascii_case(INDEX_COLUMN) {
            return Err(malformed(
                &file,
                header_line,
                format!("first column must be {INDEX_COLUMN}, found `{}`", header[0]),
            ));
        }
        let x = header[1];
        let kind = if x.eq_ignore_ascii_case(TIME_COLUMN) {
            PrnKind::Tran
        } else if x.starts_with('{') && x.ends_with('}') {
            PrnKind::Dc
        } else {
            return Err(malformed(&file, header_line, format!("unknown sweep column `{x}`")));
        };

        let mut rows = Vec::new();
        for (n, line) in lines {
            // The simulator closes the file with an "End of ..." trailer.
            if line.starts_with('E') {
                continue;
            }
            let values = line
                .split_whitespace()
                .map(|v| v.parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| malformed(&file, n, e.to_string()))?;
            if values.len() != header.len() {
                return Err(ConfigError::ColumnCountMismatch {
                    file: file.clone(),
                    row: rows.len(),
                    expected: header.len(),
                    found: values.len(),
                });
            }
            rows.push(values[1..].to_vec());
        }
        if rows.is_empty() {
            return Err(malformed(&file, header_line, "no data rows"));
        }

        Ok(Self {
            kind,
            columns: header[1..].iter().map(|s| s.to_string()).collect(),
            rows,
        })
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Splits concatenated samples into `num_mc` blocks.
    ///
    /// Transient blocks start wherever time steps backwards and must each
    /// start at zero. DC blocks are equal-length slices.
    pub fn split_blocks(&self, num_mc: usize) -> Result<Vec<PrnData>, ConfigError> {
        let file = PathBuf::from("<prn>");
        if num_mc == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_mc".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let ranges = match self.kind {
            PrnKind::Tran => {
                let mut starts = vec![0];
                starts.extend(
                    self.rows
                        .windows(2)
                        .enumerate()
                        .filter(|(_, w)| w[1][0] - w[0][0] < -TIME_EPS)
                        .map(|(i, _)| i + 1),
                );
                if starts.len() != num_mc {
                    return Err(ConfigError::RowCountMismatch {
                        file,
                        expected: num_mc,
                        found: starts.len(),
                    });
                }
                if let Some(&s) = starts.iter().find(|&&s| self.rows[s][0].abs() > TIME_EPS) {
                    return Err(malformed(&file, s, "transient block does not start at t=0"));
                }
                let mut ends = starts[1..].to_vec();
                ends.push(self.rows.len());
                starts.into_iter().zip(ends).collect::<Vec<_>>()
            }
            PrnKind::Dc => {
                if self.rows.len() % num_mc != 0 {
                    return Err(malformed(
                        &file,
                        self.rows.len(),
                        format!("{} rows do not split into {num_mc} sweeps", self.rows.len()),
                    ));
                }
                let len = self.rows.len() / num_mc;
                (0..num_mc).map(|i| (i * len, (i + 1) * len)).collect()
            }
        };

        Ok(ranges
            .into_iter()
            .map(|(start, end)| PrnData {
                kind: self.kind,
                columns: self.columns.clone(),
                rows: self.rows[start..end].to_vec(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAN: &str = "\
Index TIME V(BL0) V(BLB0)
0 0.0 1.0 1.0
1 1e-9 0.9 1.0
2 2e-9 0.8 1.0
3 0.0 1.0 1.0
4 1e-9 0.95 1.0
5 2e-9 0.85 1.0
End of Xyce(TM) Simulation
";

    const DC: &str = "\
Index {U} V(V1) V(V2)
0 -0.5 0.1 0.9
1 0.5 0.9 0.1
2 -0.5 0.2 0.8
3 0.5 0.8 0.2
";

    #[test]
    fn test_transient_blocks() -> Result<()> {
        let prn = PrnData::parse("tb.sp.prn", TRAN)?;
        assert_eq!(prn.kind, PrnKind::Tran);
        assert_eq!(prn.columns, ["TIME", "V(BL0)", "V(BLB0)"]);
        assert_eq!(prn.rows.len(), 6);

        let blocks = prn.split_blocks(2)?;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].column("v(bl0)"), Some(vec![1.0, 0.95, 0.85]));
        assert!(matches!(
            prn.split_blocks(3),
            Err(ConfigError::RowCountMismatch { found: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_dc_blocks() -> Result<()> {
        let prn = PrnData::parse("tb.sp.prn", DC)?;
        assert_eq!(prn.kind, PrnKind::Dc);
        let blocks = prn.split_blocks(2)?;
        assert_eq!(blocks[0].rows, [vec![-0.5, 0.1, 0.9], vec![0.5, 0.9, 0.1]]);
        assert!(prn.split_blocks(3).is_err());
        Ok(())
    }

    #[test]
    fn test_bad_headers() {
        assert!(PrnData::parse("a.prn", "").is_err());
        assert!(PrnData::parse("a.prn", "Index\n0\n").is_err());
        assert!(PrnData::parse("a.prn", "TIME V(A)\n0 1\n").is_err());
        assert!(PrnData::parse("a.prn", "Index FREQ V(A)\n0 1 2\n").is_err());
        assert!(PrnData::parse("a.prn", "Index TIME V(A)\n").is_err());
        assert!(PrnData::parse("a.prn", "Index TIME V(A)\n0 0.0\n").is_err());
    }

    #[test]
    fn test_block_must_start_at_zero() -> Result<()> {
        let prn = PrnData::parse("a.prn", "Index TIME V(A)\n0 0 1\n1 2e-9 1\n2 1e-9 1\n")?;
        assert!(prn.split_blocks(2).is_err());
        Ok(())
    }
}
