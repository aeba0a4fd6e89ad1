//! A small hierarchical netlist model.
//!
//! Generators implement [`Component`]; a [`NetlistCtx`] owns every subcircuit
//! definition produced while elaborating a design and enforces name uniqueness.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arcstr::ArcStr;

use crate::composer::ModelIndex;
use crate::error::{Result, StructuralError};
use crate::models::variants::VariantRegistry;

pub mod circuit;
pub mod context;
pub mod netlist;
pub mod value;

pub use circuit::{Direction, Module, MosType};
pub use context::{InstanceBuilder, SchematicCtx};
pub use value::{Param, SizingMode};

/// The simulator's reference node; the only implicitly declared net.
pub const GROUND: &str = "0";

pub trait Component: Sized {
    type Params;

    fn new(params: &Self::Params, ctx: &NetlistCtx) -> Result<Self>;

    /// The subcircuit name. Distinct definitions must have distinct names.
    fn name(&self) -> ArcStr;

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()>;
}

/// Owns the subcircuit library for one deck.
#[derive(Debug, Default)]
pub struct NetlistCtx {
    modules: Vec<Module>,
    index: HashMap<ArcStr, usize>,
    model_index: Option<Arc<ModelIndex>>,
    variants: VariantRegistry,
}

impl NetlistCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_index(model_index: Arc<ModelIndex>) -> Self {
        Self {
            model_index: Some(model_index),
            ..Default::default()
        }
    }

    #[inline]
    pub fn model_index(&self) -> Option<&ModelIndex> {
        self.model_index.as_deref()
    }

    #[inline]
    pub fn variants(&self) -> &VariantRegistry {
        &self.variants
    }

    #[inline]
    pub fn variants_mut(&mut self) -> &mut VariantRegistry {
        &mut self.variants
    }

    /// Elaborates `T` and registers the result, returning its name.
    pub fn generate<T: Component>(&mut self, params: &T::Params) -> Result<ArcStr> {
        let component = T::new(params, self)?;
        let name = component.name();
        let mut ctx = SchematicCtx::new(self, name);
        component.schematic(&mut ctx)?;
        let module = ctx.finish()?;
        self.register(module)
    }

    /// Adds a module to the library.
    ///
    /// Registering an identical definition twice is a no-op; registering a
    /// different definition under an existing name is an error.
    pub fn register(&mut self, module: Module) -> Result<ArcStr> {
        let name = module.name.clone();
        if let Some(&idx) = self.index.get(&name) {
            if self.modules[idx] != module {
                return Err(StructuralError::ConflictingSubcircuit(name).into());
            }
            return Ok(name);
        }
        self.index.insert(name.clone(), self.modules.len());
        self.modules.push(module);
        Ok(name)
    }

    /// Builds a top-level (non-subcircuit) module.
    pub fn top(&mut self, name: &str, f: impl FnOnce(&mut SchematicCtx) -> Result<()>) -> Result<Module> {
        let mut ctx = SchematicCtx::new(self, name.into());
        f(&mut ctx)?;
        ctx.finish()
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.index.get(name).map(|&idx| &self.modules[idx])
    }

    /// All definitions, each listed after the definitions it instantiates.
    #[inline]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Writes `T` and its dependencies to a standalone subcircuit library.
    pub fn write_schematic_to_file<T: Component>(
        &mut self,
        params: &T::Params,
        path: impl AsRef<Path>,
    ) -> Result<ArcStr> {
        let name = self.generate::<T>(params)?;
        netlist::save_library(self, path)?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::circuit::Direction;

    struct Divider {
        ratio: f64,
    }

    impl Component for Divider {
        type Params = f64;

        fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
            Ok(Self { ratio: *params })
        }

        fn name(&self) -> ArcStr {
            arcstr::literal!("DIVIDER")
        }

        fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
            let [a, z] = ctx.ports(["A", "Z"], Direction::InOut);
            ctx.resistor("top", [&a, &z], 1e3 * self.ratio)?;
            ctx.resistor("bot", [&z, GROUND], 1e3)?;
            Ok(())
        }
    }

    #[test]
    fn test_identical_definitions_are_shared() -> Result<()> {
        let mut lib = NetlistCtx::new();
        lib.generate::<Divider>(&1.0)?;
        lib.generate::<Divider>(&1.0)?;
        assert_eq!(lib.modules().len(), 1);
        Ok(())
    }

    #[test]
    fn test_conflicting_definitions_are_rejected() -> Result<()> {
        let mut lib = NetlistCtx::new();
        lib.generate::<Divider>(&1.0)?;
        let err = lib.generate::<Divider>(&2.0).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Structural(StructuralError::ConflictingSubcircuit(_))
        ));
        Ok(())
    }

    #[test]
    fn test_instance_binding_checks() -> Result<()> {
        let mut lib = NetlistCtx::new();
        lib.generate::<Divider>(&1.0)?;

        let err = lib
            .top("tb", |ctx| {
                let a = ctx.signal("a");
                ctx.instantiate_cell("DIVIDER")?
                    .with_bindings([&a])
                    .named("div")
                    .add_to(ctx)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Structural(StructuralError::PortCountMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));

        let err = lib
            .top("tb", |ctx| {
                let a = ctx.signal("a");
                ctx.instantiate_cell("DIVIDER")?
                    .with_connections([("A", &a)])
                    .named("div")
                    .add_to(ctx)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Structural(StructuralError::UnconnectedPort { .. })
        ));

        let err = lib
            .top("tb", |ctx| {
                let a = ctx.signal("a");
                ctx.instantiate_cell("DIVIDER")?
                    .with_bindings([a.as_str(), "floating"])
                    .named("div")
                    .add_to(ctx)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Structural(StructuralError::UndeclaredNet { .. })
        ));

        let top = lib.top("tb", |ctx| {
            let [a, z] = ctx.signals(["a", "z"]);
            ctx.instantiate_cell("DIVIDER")?
                .with_bindings([&a, &z])
                .named("div")
                .add_to(ctx)
        })?;
        assert_eq!(top.instance("div").map(|i| i.conns.len()), Some(2));
        Ok(())
    }

    #[test]
    fn test_duplicate_element_names() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let err = lib
            .top("tb", |ctx| {
                let a = ctx.signal("a");
                ctx.resistor("r0", [&a, GROUND], 1.0)?;
                ctx.resistor("R0", [&a, GROUND], 2.0)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Structural(StructuralError::DuplicateInstance { .. })
        ));
        Ok(())
    }
}
