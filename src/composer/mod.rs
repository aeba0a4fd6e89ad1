//! Building blocks shared by every generator: RC parasitic chains and
//! per-device model selection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, StructuralError};
use crate::schematic::{SchematicCtx, SizingMode, GROUND};

/// Per-segment parasitics of an RC ladder.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiRc {
    /// Series resistance in ohms.
    pub res: f64,
    /// Shunt capacitance to ground in farads.
    pub cap: f64,
}

impl Default for PiRc {
    fn default() -> Self {
        Self {
            res: 100.0,
            cap: 0.001e-12,
        }
    }
}

impl SchematicCtx<'_> {
    /// Inserts `segments` series-R / shunt-C sections after `net`.
    ///
    /// The chain ends on `end_name`, or `{net}_end` when no name is given;
    /// the returned net is the chain's far end.
    pub fn add_rc_segment(
        &mut self,
        net: &str,
        segments: usize,
        end_name: Option<&str>,
        rc: &PiRc,
    ) -> Result<ArcStr> {
        if segments == 0 {
            return Err(StructuralError::EmptyRcChain(net.into()).into());
        }
        let mut start = self.signal(net);
        for i in 0..segments {
            let end = if i + 1 == segments {
                match end_name {
                    Some(name) => self.signal(name),
                    None => self.signal(format!("{net}_end")),
                }
            } else {
                self.signal(format!("{net}_seg{i}"))
            };
            self.resistor(&format!("R_{net}_{i}"), [&start, &end], rc.res)?;
            self.capacitor(&format!("Cg_{net}_{i}"), [&end, GROUND], rc.cap)?;
            start = end;
        }
        Ok(start)
    }

    /// Returns `net` unchanged without parasitics, or the far end of an RC chain.
    pub fn maybe_rc(&mut self, net: &str, segments: usize, rc: Option<&PiRc>) -> Result<ArcStr> {
        match rc {
            Some(rc) => self.add_rc_segment(net, segments, None, rc),
            None => Ok(self.signal(net)),
        }
    }
}

/// A single-row table selecting device models by index.
///
/// The first non-empty line holds column names, the second the values.
/// Loaded once and shared read-only by every generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIndex {
    path: PathBuf,
    columns: Vec<(String, String)>,
}

impl ModelIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    pub fn parse(path: impl AsRef<Path>, text: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let (header, values) = match (lines.next(), lines.next()) {
            (Some((_, header)), Some((line, values))) => (header, (line, values)),
            _ => {
                return Err(ConfigError::MalformedTable {
                    file: path,
                    line: 1,
                    reason: "expected a header row and a value row".to_string(),
                }
                .into())
            }
        };
        let header = header.split_whitespace().collect::<Vec<_>>();
        let (line, values) = values;
        let values = values.split_whitespace().collect::<Vec<_>>();
        if header.len() != values.len() {
            return Err(ConfigError::ColumnCountMismatch {
                file: path,
                row: line + 1,
                expected: header.len(),
                found: values.len(),
            }
            .into());
        }
        let columns = header
            .into_iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(Self { path, columns })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Looks up each required column and keys the parsed index by the
    /// column's device prefix (`nmos_model_senseamp` -> `nmos`).
    pub fn lookup_device_model(&self, required_columns: &[&str]) -> Result<HashMap<String, usize>> {
        let mut models = HashMap::with_capacity(required_columns.len());
        for &column in required_columns {
            let value = self.get(column).ok_or_else(|| ConfigError::MissingColumn {
                file: self.path.clone(),
                column: column.to_string(),
            })?;
            let index = value.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                field: column.to_string(),
                reason: format!("`{value}` is not a model index"),
            })?;
            let key = column.split('_').next().unwrap_or(column);
            models.insert(key.to_string(), index);
        }
        Ok(models)
    }
}

/// Candidate models that a model index may select from.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ModelChoices {
    pub nmos: Vec<String>,
    pub pmos: Vec<String>,
}

impl Default for ModelChoices {
    fn default() -> Self {
        Self {
            nmos: vec!["NMOS_VTG".to_string()],
            pmos: vec!["PMOS_VTG".to_string()],
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DeviceModels {
    pub nmos: ArcStr,
    pub pmos: ArcStr,
}

impl Default for DeviceModels {
    fn default() -> Self {
        Self::new("NMOS_VTG", "PMOS_VTG")
    }
}

impl DeviceModels {
    pub fn new(nmos: impl Into<ArcStr>, pmos: impl Into<ArcStr>) -> Self {
        Self {
            nmos: nmos.into(),
            pmos: pmos.into(),
        }
    }

    /// Picks the models a block should use.
    ///
    /// Fixed sizing keeps `self`. Symbolic sizing replaces each device type
    /// named by `columns` with the choice the model index selects.
    pub fn resolve(
        &self,
        mode: SizingMode,
        choices: &ModelChoices,
        index: Option<&ModelIndex>,
        columns: &[&str],
    ) -> Result<Self> {
        if !mode.is_symbolic() || columns.is_empty() {
            return Ok(self.clone());
        }
        let index = index.ok_or_else(|| ConfigError::InvalidValue {
            field: columns.join(","),
            reason: "symbolic sizing needs a model index table".to_string(),
        })?;
        let selected = index.lookup_device_model(columns)?;
        let pick = |key: &str, list: &[String], fallback: &ArcStr| -> Result<ArcStr> {
            match selected.get(key) {
                Some(&i) => list.get(i).map(|m| ArcStr::from(m.as_str())).ok_or_else(|| {
                    ConfigError::ModelChoiceOutOfRange {
                        column: key.to_string(),
                        index: i,
                        available: list.len(),
                    }
                    .into()
                }),
                None => Ok(fallback.clone()),
            }
        };
        Ok(Self {
            nmos: pick("nmos", &choices.nmos, &self.nmos)?,
            pmos: pick("pmos", &choices.pmos, &self.pmos)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schematic::circuit::Element;
    use crate::schematic::NetlistCtx;

    #[test]
    fn test_rc_segment_names() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let rc = PiRc::default();
        let mut end = None;
        let top = lib.top("tb", |ctx| {
            ctx.signal("BL");
            end = Some(ctx.add_rc_segment("BL", 3, None, &rc)?);
            Ok(())
        })?;
        assert_eq!(end.as_deref(), Some("BL_end"));
        let names = top
            .elements
            .iter()
            .map(|e| format!("{}{}", e.prefix(), e.name()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["RR_BL_0", "CCg_BL_0", "RR_BL_1", "CCg_BL_1", "RR_BL_2", "CCg_BL_2"]
        );
        let Element::Res(r1) = &top.elements[2] else {
            panic!("expected a resistor");
        };
        assert_eq!((r1.p.as_str(), r1.n.as_str()), ("BL_seg0", "BL_seg1"));
        Ok(())
    }

    #[test]
    fn test_rc_segment_named_end() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let top = lib.top("tb", |ctx| {
            let end = ctx.add_rc_segment("WL", 1, Some("WL_cell"), &PiRc::default())?;
            assert_eq!(end.as_str(), "WL_cell");
            Ok(())
        })?;
        assert_eq!(top.elements.len(), 2);
        Ok(())
    }

    #[test]
    fn test_rc_segment_rejects_zero_segments() {
        let mut lib = NetlistCtx::new();
        let err = lib
            .top("tb", |ctx| ctx.add_rc_segment("BL", 0, None, &PiRc::default()).map(|_| ()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Structural(StructuralError::EmptyRcChain(_))
        ));
    }

    #[test]
    fn test_lookup_device_model() -> Result<()> {
        let index = ModelIndex::parse(
            "models.txt",
            "pmos_model_precharge nmos_model_senseamp pmos_model_senseamp\n1 0 2\n",
        )?;
        let models = index.lookup_device_model(&["nmos_model_senseamp", "pmos_model_senseamp"])?;
        assert_eq!(models.get("nmos"), Some(&0));
        assert_eq!(models.get("pmos"), Some(&2));

        let err = index
            .lookup_device_model(&["nmos_model_wrd"])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingColumn { ref column, .. }) if column == "nmos_model_wrd"
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_models() -> Result<()> {
        let index = ModelIndex::parse("models.txt", "pmos_model_precharge\n1\n")?;
        let choices = ModelChoices {
            nmos: vec!["NMOS_VTG".into()],
            pmos: vec!["PMOS_VTG".into(), "PMOS_HVT".into()],
        };
        let fixed = DeviceModels::default();
        let models = fixed.resolve(
            SizingMode::Symbolic,
            &choices,
            Some(&index),
            &["pmos_model_precharge"],
        )?;
        assert_eq!(models, DeviceModels::new("NMOS_VTG", "PMOS_HVT"));
        assert_eq!(
            fixed.resolve(SizingMode::Fixed, &choices, Some(&index), &["pmos_model_precharge"])?,
            fixed
        );

        let index = ModelIndex::parse("models.txt", "pmos_model_precharge\n5\n")?;
        assert!(fixed
            .resolve(SizingMode::Symbolic, &choices, Some(&index), &["pmos_model_precharge"])
            .is_err());
        Ok(())
    }

    #[test]
    fn test_malformed_model_index() {
        assert!(ModelIndex::parse("models.txt", "pmos_model_precharge\n").is_err());
        assert!(ModelIndex::parse("models.txt", "a b\n1\n").is_err());
    }
}
