//! Per-device model copies for mismatch analysis.
//!
//! Every transistor of a replicated cell gets its own model card so the
//! simulator can perturb it independently of its neighbors.

use std::collections::HashMap;

use arcstr::ArcStr;

use super::{ModelCard, ModelLibrary, ModelValue, SENSITIVE_PARAMS};
use crate::error::{Result, StructuralError};

/// Identifies the device a variant was created for.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VariantKey {
    pub base: ArcStr,
    pub role: ArcStr,
    pub row: usize,
    pub col: usize,
}

/// The single owner of every generated variant name.
#[derive(Debug, Default, Clone)]
pub struct VariantRegistry {
    order: Vec<ArcStr>,
    keys: HashMap<ArcStr, VariantKey>,
}

pub fn variant_name(base: &str, role: &str, row: usize, col: usize) -> ArcStr {
    arcstr::format!("{base}_{role}_{row}_{col}")
}

/// The netlist parameter standing in for `param` of `variant`.
pub fn placeholder(param: &str, variant: &str) -> String {
    format!("{param}_{variant}")
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the variant name for a device, creating it on first use.
    ///
    /// Asking again for the same device returns the same name. Two different
    /// devices that would map to one name are rejected.
    pub fn register(&mut self, base: &str, role: &str, row: usize, col: usize) -> Result<ArcStr> {
        let name = variant_name(base, role, row, col);
        let key = VariantKey {
            base: base.into(),
            role: role.into(),
            row,
            col,
        };
        match self.keys.get(&name) {
            Some(existing) if *existing == key => Ok(name),
            Some(_) => Err(StructuralError::DuplicateModel(name).into()),
            None => {
                self.keys.insert(name.clone(), key);
                self.order.push(name.clone());
                Ok(name)
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Variant names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &ArcStr> {
        self.order.iter()
    }

    /// Every placeholder parameter, grouped by variant in registration order.
    pub fn placeholders(&self) -> Vec<String> {
        self.order
            .iter()
            .flat_map(|name| SENSITIVE_PARAMS.iter().map(move |p| placeholder(p, name)))
            .collect()
    }

    /// Copies each variant's base card from `library`, renaming it and
    /// replacing the sensitive parameters with placeholders.
    pub fn model_cards(&self, library: &ModelLibrary) -> Result<Vec<ModelCard>> {
        let mut cards = Vec::with_capacity(self.order.len());
        for name in self.order.iter() {
            let key = &self.keys[name];
            let mut card = library.require(&key.base)?.clone();
            card.name = name.clone();
            for (param, value) in card.params.iter_mut() {
                if SENSITIVE_PARAMS.contains(&param.as_str()) {
                    *value = ModelValue::Str(format!("'{}'", placeholder(param, name)));
                }
            }
            cards.push(card);
        }
        Ok(cards)
    }

    /// Nominal values of every placeholder, in [`VariantRegistry::placeholders`] order.
    pub fn nominal_values(&self, library: &ModelLibrary) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.order.len() * SENSITIVE_PARAMS.len());
        for name in self.order.iter() {
            let card = library.require(&self.keys[name].base)?;
            for param in SENSITIVE_PARAMS {
                values.push(card.param(param).and_then(ModelValue::as_f64).unwrap_or(0.0));
            }
        }
        Ok(values)
    }
}
