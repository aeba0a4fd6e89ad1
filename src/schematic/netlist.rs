use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use super::circuit::{Element, Module};
use super::NetlistCtx;
use crate::error::Result;

pub trait NetlistBackend {
    fn subcircuit(&mut self, name: &str, ports: &[&str]) -> Result<()>;
    fn end_subcircuit(&mut self) -> Result<()>;
    fn instance(
        &mut self,
        name: &str,
        terminals: &[&str],
        cell: &str,
        params: &[&str],
    ) -> Result<()>;
    fn element(&mut self, element: &Element) -> Result<()>;
}

pub struct SpiceBackend<W: Write> {
    out: W,
}

impl<W: Write> SpiceBackend<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a pre-formatted directive or text block verbatim.
    pub fn raw(&mut self, text: &str) -> Result<()> {
        if text.ends_with('\n') {
            write!(self.out, "{text}")?;
        } else {
            writeln!(self.out, "{text}")?;
        }
        Ok(())
    }

    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.out)?;
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        writeln!(self.out, ".end")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> NetlistBackend for SpiceBackend<W> {
    fn subcircuit(&mut self, name: &str, ports: &[&str]) -> Result<()> {
        writeln!(self.out, ".subckt {} {}", name, ports.iter().join(" "))?;
        Ok(())
    }

    fn end_subcircuit(&mut self) -> Result<()> {
        writeln!(self.out, ".ends")?;
        Ok(())
    }

    fn instance(
        &mut self,
        name: &str,
        terminals: &[&str],
        cell: &str,
        params: &[&str],
    ) -> Result<()> {
        write!(self.out, "X{}", name)?;

        for t in terminals {
            write!(self.out, " {}", *t)?;
        }

        write!(self.out, " {}", cell)?;

        for param in params {
            write!(self.out, " {}", *param)?;
        }

        writeln!(self.out)?;

        Ok(())
    }

    fn element(&mut self, element: &Element) -> Result<()> {
        let prefix = element.prefix();
        match element {
            Element::Mos(m) => writeln!(
                self.out,
                "{prefix}{} {} {} {} {} {} W={} L={}",
                m.name, m.d, m.g, m.s, m.b, m.model, m.width, m.length
            )?,
            Element::Res(r) => writeln!(self.out, "{prefix}{} {} {} {}", r.name, r.p, r.n, r.value)?,
            Element::Cap(c) => writeln!(self.out, "{prefix}{} {} {} {}", c.name, c.p, c.n, c.value)?,
            Element::Instance(i) => {
                let terminals = i.conns.iter().map(|c| c.as_str()).collect::<Vec<_>>();
                self.instance(&i.name, &terminals, &i.cell, &[])?;
            }
            Element::Vsource(v) => writeln!(
                self.out,
                "{prefix}{} {} {} {}",
                v.name, v.p, v.n, v.waveform
            )?,
            Element::Vcvs(e) => writeln!(
                self.out,
                "{prefix}{} {} {} VOL='{}'",
                e.name, e.p, e.n, e.expr
            )?,
        }
        Ok(())
    }
}

/// Writes `module` as a `.subckt` block, or inline when `top` is set.
pub fn write_module(backend: &mut dyn NetlistBackend, module: &Module, top: bool) -> Result<()> {
    if !top {
        let ports = module.port_names().map(|p| p.as_str()).collect::<Vec<_>>();
        backend.subcircuit(&module.name, &ports)?;
    }
    for element in module.elements.iter() {
        backend.element(element)?;
    }
    if !top {
        backend.end_subcircuit()?;
    }
    Ok(())
}

pub fn write_library(backend: &mut dyn NetlistBackend, lib: &NetlistCtx) -> Result<()> {
    for module in lib.modules() {
        write_module(backend, module, false)?;
    }
    Ok(())
}

/// Saves every subcircuit in `lib` to `path`.
pub fn save_library(lib: &NetlistCtx, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut backend = SpiceBackend::new(BufWriter::new(File::create(path)?));
    write_library(&mut backend, lib)?;
    backend.into_inner().flush()?;
    log::info!("wrote subcircuit library to {path:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::circuit::{Pulse, Waveform};
    use crate::schematic::{Param, GROUND};

    #[test]
    fn test_element_lines() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let top = lib.top("tb", |ctx| {
            let [vdd, a, z] = ctx.signals(["VDD", "A", "Z"]);
            ctx.mos(
                "mp",
                crate::schematic::MosType::Pmos,
                [&z, &a, &vdd, &vdd],
                "PMOS_VTG",
                Param::Fixed(0.27e-6),
                Param::Symbolic(arcstr::literal!("length")),
            )?;
            ctx.resistor("R_Z_0", [&z, GROUND], 100.0)?;
            ctx.vsource("VDD", [&vdd, GROUND], Waveform::Dc(1.0))?;
            ctx.vsource(
                "A",
                [&a, GROUND],
                Waveform::Pulse(Pulse {
                    v1: 0.0,
                    v2: 1.0,
                    delay: 5e-9,
                    rise: 1e-10,
                    fall: 1e-10,
                    width: 1e-8,
                    period: 6e-8,
                }),
            )?;
            ctx.vcvs("V1", ["V1", GROUND], "U+sqrt(2)*V(X9T:QBD)")
        });
        // V1 is not declared in this scope.
        assert!(top.is_err());

        let top = lib.top("tb", |ctx| {
            let [vdd, a, z] = ctx.signals(["VDD", "A", "Z"]);
            ctx.mos(
                "mp",
                crate::schematic::MosType::Pmos,
                [&z, &a, &vdd, &vdd],
                "PMOS_VTG",
                Param::Fixed(0.27e-6),
                Param::Symbolic(arcstr::literal!("length")),
            )?;
            ctx.resistor("R_Z_0", [&z, GROUND], 100.0)?;
            ctx.vsource("VDD", [&vdd, GROUND], Waveform::Dc(1.0))
        })?;

        let mut backend = SpiceBackend::new(Vec::new());
        write_module(&mut backend, &top, true)?;
        let text = String::from_utf8(backend.into_inner()).expect("netlist is utf-8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            [
                "Mmp Z A VDD VDD PMOS_VTG W=2.7000e-7 L='length'",
                "RR_Z_0 Z 0 1.0000e2",
                "VVDD VDD 0 1",
            ]
        );
        Ok(())
    }
}
