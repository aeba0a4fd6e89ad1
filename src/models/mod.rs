//! Device model library files: `.model NAME TYPE param=value ...` cards.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use arcstr::ArcStr;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ConfigError, Result};
use crate::schematic::value::fmt_model_value;

pub mod monte_carlo;
pub mod variants;

/// Parameters that receive per-instance or statistical values.
pub const SENSITIVE_PARAMS: [&str; 3] = ["vth0", "u0", "voff"];

const PARAMS_PER_LINE: usize = 4;

lazy_static! {
    static ref MODEL_SPLIT: Regex = Regex::new(r"(?i)\.model\s+").unwrap();
    static ref PARAM_PAIR: Regex = Regex::new(r"(\w+)\s*=\s*(\{[^}]*\}|\S+)").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    Int(i64),
    Float(f64),
    /// Anything else, written back verbatim (expressions, placeholders).
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelCard {
    pub name: ArcStr,
    pub kind: String,
    pub params: Vec<(String, ModelValue)>,
}

/// An ordered collection of model cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelLibrary {
    models: Vec<ModelCard>,
}

impl ModelValue {
    /// Integers are tokens without a decimal point or exponent; anything
    /// that fails to parse as a number is kept as a string.
    pub fn parse(token: &str) -> Self {
        if !token.contains('.') && !token.to_ascii_lowercase().contains('e') {
            if let Ok(x) = token.parse::<i64>() {
                return ModelValue::Int(x);
            }
        } else if let Ok(x) = token.parse::<f64>() {
            return ModelValue::Float(x);
        }
        ModelValue::Str(token.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ModelValue::Int(x) => Some(*x as f64),
            ModelValue::Float(x) => Some(*x),
            ModelValue::Str(_) => None,
        }
    }
}

impl Display for ModelValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelValue::Int(x) => write!(f, "{x}"),
            ModelValue::Float(x) => write!(f, "{}", fmt_model_value(*x)),
            ModelValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl ModelCard {
    pub fn param(&self, name: &str) -> Option<&ModelValue> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, ".model  {}  {}", self.name, self.kind)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i % PARAMS_PER_LINE == 0 {
                write!(out, "\n+")?;
            }
            write!(out, "{:>12} = {:<26}", name, value.to_string())?;
        }
        write!(out, "\n\n")?;
        Ok(())
    }
}

impl ModelLibrary {
    pub fn new(models: Vec<ModelCard>) -> Self {
        Self { models }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let lib = Self::parse(&text);
        log::debug!("parsed {} models from {path:?}", lib.models.len());
        Ok(lib)
    }

    /// Parses every `.model` card in `text`.
    ///
    /// `*` starts a comment that runs to the end of the line; a leading `+`
    /// marks a continuation line.
    pub fn parse(text: &str) -> Self {
        let mut models = Vec::new();
        for section in MODEL_SPLIT.split(text).skip(1) {
            let mut lines = section.trim().lines();
            let Some(first) = lines.next() else {
                continue;
            };
            let mut parts = strip_comment(first).split_whitespace();
            let (Some(name), Some(kind)) = (parts.next(), parts.next()) else {
                continue;
            };
            let mut body = parts.collect::<Vec<_>>().join(" ");
            for line in lines {
                let line = strip_comment(line).trim();
                let line = line.strip_prefix('+').unwrap_or(line);
                body.push(' ');
                body.push_str(line);
            }
            let params = PARAM_PAIR
                .captures_iter(&body)
                .map(|cap| (cap[1].to_string(), ModelValue::parse(&cap[2])))
                .collect();
            models.push(ModelCard {
                name: name.into(),
                kind: kind.to_string(),
                params,
            });
        }
        Self { models }
    }

    #[inline]
    pub fn models(&self) -> &[ModelCard] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [ModelCard] {
        &mut self.models
    }

    pub fn get(&self, name: &str) -> Option<&ModelCard> {
        self.models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn require(&self, name: &str) -> Result<&ModelCard> {
        Ok(self
            .get(name)
            .ok_or_else(|| ConfigError::MissingModel(name.to_string()))?)
    }

    pub fn push(&mut self, card: ModelCard) {
        self.models.push(card);
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        for model in self.models.iter() {
            model.write(out)?;
        }
        writeln!(out)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        log::info!("wrote {} model cards to {path:?}", self.models.len());
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('*') {
        Some(idx) => &line[..idx],
        None => line,
    }
}
