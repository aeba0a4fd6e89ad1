use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use super::value::{fmt_sci, Param};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
    InOut,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Port {
    pub name: ArcStr,
    pub direction: Direction,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MosType {
    Nmos,
    Pmos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mosfet {
    pub name: ArcStr,
    pub mos_type: MosType,
    pub d: ArcStr,
    pub g: ArcStr,
    pub s: ArcStr,
    pub b: ArcStr,
    pub model: ArcStr,
    pub width: Param,
    pub length: Param,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub name: ArcStr,
    pub p: ArcStr,
    pub n: ArcStr,
    pub value: Param,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub name: ArcStr,
    pub p: ArcStr,
    pub n: ArcStr,
    pub value: Param,
}

/// A trapezoidal pulse: `PULSE(v1 v2 delay rise fall width period)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pulse {
    pub v1: f64,
    pub v2: f64,
    pub delay: f64,
    pub rise: f64,
    pub fall: f64,
    pub width: f64,
    pub period: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Waveform {
    Dc(f64),
    Pulse(Pulse),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vsource {
    pub name: ArcStr,
    pub p: ArcStr,
    pub n: ArcStr,
    pub waveform: Waveform,
}

/// Behavioral voltage source `E{name} p n VOL='expr'`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vcvs {
    pub name: ArcStr,
    pub p: ArcStr,
    pub n: ArcStr,
    pub expr: String,
}

/// A subcircuit instance with its nets bound in the definition's port order.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: ArcStr,
    pub cell: ArcStr,
    pub conns: Vec<ArcStr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Mos(Mosfet),
    Res(Resistor),
    Cap(Capacitor),
    Instance(Instance),
    Vsource(Vsource),
    Vcvs(Vcvs),
}

/// A subcircuit definition, or the top level of a deck.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: ArcStr,
    pub ports: Vec<Port>,
    pub signals: Vec<ArcStr>,
    pub elements: Vec<Element>,
}

impl Element {
    pub fn name(&self) -> &ArcStr {
        match self {
            Element::Mos(m) => &m.name,
            Element::Res(r) => &r.name,
            Element::Cap(c) => &c.name,
            Element::Instance(i) => &i.name,
            Element::Vsource(v) => &v.name,
            Element::Vcvs(e) => &e.name,
        }
    }

    /// SPICE element letter prepended to the name on output.
    pub fn prefix(&self) -> char {
        match self {
            Element::Mos(_) => 'M',
            Element::Res(_) => 'R',
            Element::Cap(_) => 'C',
            Element::Instance(_) => 'X',
            Element::Vsource(_) => 'V',
            Element::Vcvs(_) => 'E',
        }
    }

    pub fn nets(&self) -> Vec<&ArcStr> {
        match self {
            Element::Mos(m) => vec![&m.d, &m.g, &m.s, &m.b],
            Element::Res(r) => vec![&r.p, &r.n],
            Element::Cap(c) => vec![&c.p, &c.n],
            Element::Instance(i) => i.conns.iter().collect(),
            Element::Vsource(v) => vec![&v.p, &v.n],
            Element::Vcvs(e) => vec![&e.p, &e.n],
        }
    }
}

impl Module {
    pub fn port_names(&self) -> impl Iterator<Item = &ArcStr> {
        self.ports.iter().map(|p| &p.name)
    }

    pub fn mosfets(&self) -> impl Iterator<Item = &Mosfet> {
        self.elements.iter().filter_map(|e| match e {
            Element::Mos(m) => Some(m),
            _ => None,
        })
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.elements.iter().filter_map(|e| match e {
            Element::Instance(i) => Some(i),
            _ => None,
        })
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances().find(|i| i.name == name)
    }
}

impl Display for Pulse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PULSE({} {} {} {} {} {} {})",
            self.v1,
            self.v2,
            fmt_sci(self.delay),
            fmt_sci(self.rise),
            fmt_sci(self.fall),
            fmt_sci(self.width),
            fmt_sci(self.period),
        )
    }
}

impl Display for Waveform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Waveform::Dc(v) => write!(f, "{v}"),
            Waveform::Pulse(p) => write!(f, "{p}"),
        }
    }
}

impl Display for MosType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MosType::Nmos => write!(f, "nmos"),
            MosType::Pmos => write!(f, "pmos"),
        }
    }
}
