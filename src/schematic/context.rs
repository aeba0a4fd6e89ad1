use std::collections::{HashMap, HashSet};

use arcstr::ArcStr;

use super::circuit::{
    Capacitor, Direction, Element, Instance, Module, MosType, Mosfet, Port, Resistor, Vcvs,
    Vsource, Waveform,
};
use super::value::Param;
use super::{Component, NetlistCtx, GROUND};
use crate::error::{Result, StructuralError};

/// Collects the ports, signals and elements of one module while it is generated.
pub struct SchematicCtx<'a> {
    lib: &'a mut NetlistCtx,
    module: Module,
    nets: HashSet<ArcStr>,
    names: HashSet<String>,
    error: Option<StructuralError>,
}

/// A pending instance; nets are bound by port name or positionally.
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    name: Option<ArcStr>,
    cell: ArcStr,
    ports: Vec<ArcStr>,
    conns: HashMap<ArcStr, ArcStr>,
    ordered: Option<Vec<ArcStr>>,
}

impl<'a> SchematicCtx<'a> {
    pub(crate) fn new(lib: &'a mut NetlistCtx, name: ArcStr) -> Self {
        Self {
            lib,
            module: Module {
                name,
                ports: Vec::new(),
                signals: Vec::new(),
                elements: Vec::new(),
            },
            nets: HashSet::new(),
            names: HashSet::new(),
            error: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.module.name
    }

    #[inline]
    pub fn lib_mut(&mut self) -> &mut NetlistCtx {
        &mut *self.lib
    }

    pub fn port(&mut self, name: impl Into<ArcStr>, direction: Direction) -> ArcStr {
        let name = name.into();
        if !self.nets.insert(name.clone()) {
            self.record(StructuralError::DuplicateNet {
                cell: self.module.name.clone(),
                net: name.clone(),
            });
        }
        self.module.ports.push(Port {
            name: name.clone(),
            direction,
        });
        name
    }

    pub fn ports<const N: usize>(&mut self, names: [&str; N], direction: Direction) -> [ArcStr; N] {
        names.map(|name| self.port(name, direction))
    }

    pub fn port_bus(&mut self, prefix: &str, width: usize, direction: Direction) -> Vec<ArcStr> {
        (0..width)
            .map(|i| self.port(format!("{prefix}{i}"), direction))
            .collect()
    }

    /// Declares a local net. Declaring an existing net returns it unchanged.
    pub fn signal(&mut self, name: impl Into<ArcStr>) -> ArcStr {
        let name = name.into();
        if self.nets.insert(name.clone()) {
            self.module.signals.push(name.clone());
        }
        name
    }

    pub fn signals<const N: usize>(&mut self, names: [&str; N]) -> [ArcStr; N] {
        names.map(|name| self.signal(name))
    }

    pub fn bus(&mut self, prefix: &str, width: usize) -> Vec<ArcStr> {
        (0..width)
            .map(|i| self.signal(format!("{prefix}{i}")))
            .collect()
    }

    /// Generates `T` in the library (once per distinct definition) and returns
    /// a builder for an instance of it.
    pub fn instantiate<T: Component>(&mut self, params: &T::Params) -> Result<InstanceBuilder> {
        let cell = self.lib.generate::<T>(params)?;
        self.instantiate_cell(&cell)
    }

    /// Instantiates a module already present in the library.
    pub fn instantiate_cell(&self, cell: &str) -> Result<InstanceBuilder> {
        let module = self
            .lib
            .module(cell)
            .ok_or_else(|| StructuralError::UnknownSubcircuit(cell.into()))?;
        Ok(InstanceBuilder {
            name: None,
            cell: module.name.clone(),
            ports: module.port_names().cloned().collect(),
            conns: HashMap::new(),
            ordered: None,
        })
    }

    pub fn add_instance(&mut self, instance: InstanceBuilder) -> Result<()> {
        let instance = instance.resolve()?;
        self.add_element(Element::Instance(instance))
    }

    pub fn add_element(&mut self, element: Element) -> Result<()> {
        let key = format!("{}{}", element.prefix(), element.name()).to_uppercase();
        if !self.names.insert(key) {
            return Err(StructuralError::DuplicateInstance {
                cell: self.module.name.clone(),
                name: element.name().clone(),
            }
            .into());
        }
        self.module.elements.push(element);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mos(
        &mut self,
        name: &str,
        mos_type: MosType,
        [d, g, s, b]: [&str; 4],
        model: &str,
        width: Param,
        length: Param,
    ) -> Result<()> {
        self.add_element(Element::Mos(Mosfet {
            name: name.into(),
            mos_type,
            d: d.into(),
            g: g.into(),
            s: s.into(),
            b: b.into(),
            model: model.into(),
            width,
            length,
        }))
    }

    pub fn resistor(&mut self, name: &str, [p, n]: [&str; 2], value: impl Into<Param>) -> Result<()> {
        self.add_element(Element::Res(Resistor {
            name: name.into(),
            p: p.into(),
            n: n.into(),
            value: value.into(),
        }))
    }

    pub fn capacitor(&mut self, name: &str, [p, n]: [&str; 2], value: impl Into<Param>) -> Result<()> {
        self.add_element(Element::Cap(Capacitor {
            name: name.into(),
            p: p.into(),
            n: n.into(),
            value: value.into(),
        }))
    }

    pub fn vsource(&mut self, name: &str, [p, n]: [&str; 2], waveform: Waveform) -> Result<()> {
        self.add_element(Element::Vsource(Vsource {
            name: name.into(),
            p: p.into(),
            n: n.into(),
            waveform,
        }))
    }

    pub fn vcvs(&mut self, name: &str, [p, n]: [&str; 2], expr: impl Into<String>) -> Result<()> {
        self.add_element(Element::Vcvs(Vcvs {
            name: name.into(),
            p: p.into(),
            n: n.into(),
            expr: expr.into(),
        }))
    }

    fn record(&mut self, error: StructuralError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Checks that every net an element touches is declared in this scope.
    pub(crate) fn finish(self) -> Result<Module> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        for element in self.module.elements.iter() {
            for net in element.nets() {
                if !(net.as_str() == GROUND || self.nets.contains(net)) {
                    return Err(StructuralError::UndeclaredNet {
                        cell: self.module.name.clone(),
                        net: net.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(self.module)
    }
}

impl InstanceBuilder {
    pub fn named(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_connections<K, V>(mut self, conns: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (port, net) in conns {
            self.connect(port, net);
        }
        self
    }

    pub fn connect(&mut self, port: impl AsRef<str>, net: impl AsRef<str>) {
        self.conns
            .insert(ArcStr::from(port.as_ref()), ArcStr::from(net.as_ref()));
    }

    /// Binds nets positionally, in the definition's port order.
    pub fn with_bindings<V: AsRef<str>>(mut self, nets: impl IntoIterator<Item = V>) -> Self {
        self.ordered = Some(nets.into_iter().map(|n| ArcStr::from(n.as_ref())).collect());
        self
    }

    #[inline]
    pub fn ports(&self) -> &[ArcStr] {
        &self.ports
    }

    #[inline]
    pub fn cell(&self) -> &ArcStr {
        &self.cell
    }

    pub fn add_to(self, ctx: &mut SchematicCtx) -> Result<()> {
        ctx.add_instance(self)
    }

    fn resolve(self) -> Result<Instance, StructuralError> {
        let name = self.name.unwrap_or_else(|| self.cell.clone());
        let conns = match self.ordered {
            Some(ordered) => {
                if ordered.len() != self.ports.len() {
                    return Err(StructuralError::PortCountMismatch {
                        instance: name,
                        cell: self.cell,
                        expected: self.ports.len(),
                        found: ordered.len(),
                    });
                }
                ordered
            }
            None => {
                if let Some(port) = self.conns.keys().find(|k| !self.ports.contains(*k)) {
                    return Err(StructuralError::UnknownPort {
                        instance: name,
                        port: port.clone(),
                    });
                }
                let mut conns = Vec::with_capacity(self.ports.len());
                for port in self.ports.iter() {
                    match self.conns.get(port) {
                        Some(net) => conns.push(net.clone()),
                        None => {
                            return Err(StructuralError::UnconnectedPort {
                                instance: name,
                                port: port.clone(),
                            })
                        }
                    }
                }
                conns
            }
        };
        Ok(Instance {
            name,
            cell: self.cell,
            conns,
        })
    }
}
