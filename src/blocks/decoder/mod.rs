use arcstr::ArcStr;

use crate::clog2;
use crate::composer::{DeviceModels, PiRc};
use crate::error::{Result, StructuralError};
use crate::schematic::{Component, NetlistCtx, SchematicCtx, SizingMode};

use super::gate::{AndParams, GateSweepNames};

pub mod schematic;

/// Address bits consumed by one decoder block.
pub const BLOCK_BITS: usize = 3;
/// One-hot outputs of one decoder block.
pub const BLOCK_OUTPUTS: usize = 1 << BLOCK_BITS;

pub const DECODER_SWEEP_NAMES: GateSweepNames = GateSweepNames {
    nand_pwidth: "pmos_width_decoder_nandp",
    nand_nwidth: "nmos_width_decoder_nandn",
    inv_pwidth: "pmos_width_decoder_invp",
    inv_nwidth: "nmos_width_decoder_invn",
    length: "length_decoder",
};

/// A fixed 3:8 decoder with an active-high enable.
pub struct Decoder3To8 {
    params: AndParams,
}

/// A tree of [`Decoder3To8`] blocks decoding `num_rows` one-hot outputs.
pub struct DecoderCascade {
    params: DecoderParams,
    plan: DecoderPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoderParams {
    pub num_rows: usize,
    pub gates: AndParams,
}

impl DecoderParams {
    pub fn new(num_rows: usize, models: DeviceModels) -> Self {
        Self {
            num_rows,
            gates: AndParams::new(models),
        }
    }

    pub fn with_rc(mut self, rc: Option<PiRc>) -> Self {
        self.gates.rc = rc;
        self
    }

    pub fn resolve(mut self, mode: SizingMode) -> Self {
        self.gates = self.gates.resolve(mode, &DECODER_SWEEP_NAMES);
        self
    }
}

/// How the address bits of a cascade are split across levels.
///
/// Level 0 decodes the most significant bits; the last level drives the rows.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecoderPlan {
    pub num_rows: usize,
    pub n_bits: usize,
    pub n_levels: usize,
    /// Number of blocks at each level.
    pub level_sizes: Vec<usize>,
}

impl DecoderPlan {
    pub fn new(num_rows: usize) -> Result<Self> {
        if num_rows == 0 {
            return Err(StructuralError::EmptyDimension("num_rows").into());
        }
        let n_bits = clog2(num_rows.max(2));
        let n_levels = div_ceil(n_bits, BLOCK_BITS);

        let mut level_sizes = vec![0; n_levels];
        level_sizes[n_levels - 1] = div_ceil(num_rows, BLOCK_OUTPUTS);
        for level in (0..n_levels - 1).rev() {
            level_sizes[level] = div_ceil(level_sizes[level + 1], BLOCK_OUTPUTS);
        }

        Ok(Self {
            num_rows,
            n_bits,
            n_levels,
            level_sizes,
        })
    }

    #[inline]
    pub fn is_last(&self, level: usize) -> bool {
        level + 1 == self.n_levels
    }

    /// The first address bit decoded by blocks at `level`.
    #[inline]
    pub fn start_bit(&self, level: usize) -> usize {
        BLOCK_BITS * (self.n_levels - level - 1)
    }

    /// Nets bound to a block's `A0`, `A1`, `A2` inputs, in that order.
    ///
    /// Bits beyond the address width are tied to `VSS`.
    pub fn address_nets(&self, level: usize) -> [ArcStr; BLOCK_BITS] {
        let start = self.start_bit(level);
        std::array::from_fn(|i| {
            let bit = start + i;
            if bit < self.n_bits {
                arcstr::format!("A{bit}")
            } else {
                arcstr::literal!("VSS")
            }
        })
    }

    /// The enable of `block` at `level`: `VDD` at the root, otherwise output
    /// `block` of the previous level counted across all of its blocks.
    pub fn enable_net(&self, level: usize, block: usize) -> ArcStr {
        if level == 0 {
            return arcstr::literal!("VDD");
        }
        let parent = block / BLOCK_OUTPUTS;
        if parent < self.level_sizes[level - 1] {
            self.output_net(level - 1, parent, block % BLOCK_OUTPUTS)
        } else {
            arcstr::literal!("VSS")
        }
    }

    pub fn output_net(&self, level: usize, block: usize, output: usize) -> ArcStr {
        if !self.is_last(level) {
            return arcstr::format!("EN_{level}_{block}_{output}");
        }
        let row = block * BLOCK_OUTPUTS + output;
        if row < self.num_rows {
            arcstr::format!("WL{row}")
        } else {
            arcstr::format!("NC_{level}_{block}_{output}")
        }
    }

    /// Output nets of `block`; every block keeps all eight.
    pub fn output_nets(&self, level: usize, block: usize) -> Vec<ArcStr> {
        (0..BLOCK_OUTPUTS)
            .map(|i| self.output_net(level, block, i))
            .collect()
    }

    /// Terminal outputs that do not drive a row.
    pub fn num_unused_outputs(&self) -> usize {
        self.level_sizes[self.n_levels - 1] * BLOCK_OUTPUTS - self.num_rows
    }
}

#[inline]
fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

impl Component for Decoder3To8 {
    type Params = AndParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("DECODER3_8")
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}

impl Component for DecoderCascade {
    type Params = DecoderParams;
    fn new(params: &Self::Params, _ctx: &NetlistCtx) -> Result<Self> {
        Ok(Self {
            params: params.clone(),
            plan: DecoderPlan::new(params.num_rows)?,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("DECODER_CASCADE_{}", self.params.num_rows)
    }

    fn schematic(&self, ctx: &mut SchematicCtx) -> Result<()> {
        self.schematic(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use crate::paths::out_spice;
    use crate::schematic::Module;
    use crate::tests::test_work_dir;

    use super::*;

    macro_rules! test_plan {
        ($rows:literal, $bits:literal, [$($size:literal),+], unused: $unused:literal) => {
            paste::paste! {
                #[test]
                fn [<test_decoder_plan_ $rows _rows>]() -> Result<()> {
                    let plan = DecoderPlan::new($rows)?;
                    let sizes: Vec<usize> = vec![$($size),+];
                    assert_eq!(plan.n_bits, $bits);
                    assert_eq!(plan.n_levels, sizes.len());
                    assert_eq!(plan.level_sizes, sizes);
                    assert_eq!(plan.num_unused_outputs(), $unused);
                    Ok(())
                }
            }
        };
    }

    test_plan!(1, 1, [1], unused: 7);
    test_plan!(2, 1, [1], unused: 6);
    test_plan!(8, 3, [1], unused: 0);
    test_plan!(9, 4, [1, 2], unused: 7);
    test_plan!(64, 6, [1, 8], unused: 0);
    test_plan!(100, 7, [1, 2, 13], unused: 4);
    test_plan!(512, 9, [1, 8, 64], unused: 0);

    #[test]
    fn test_zero_rows_is_rejected() {
        assert!(DecoderPlan::new(0).is_err());
    }

    #[test]
    fn test_out_of_range_bits_are_grounded() -> Result<()> {
        let plan = DecoderPlan::new(9)?;
        assert_eq!(plan.address_nets(0), ["A3", "VSS", "VSS"]);
        assert_eq!(plan.address_nets(1), ["A0", "A1", "A2"]);
        assert_eq!(plan.enable_net(0, 0), "VDD");
        assert_eq!(plan.enable_net(1, 1), "EN_0_0_1");
        assert_eq!(plan.output_net(1, 1, 0), "WL8");
        assert_eq!(plan.output_net(1, 1, 1), "NC_1_1_1");

        let plan = DecoderPlan::new(1)?;
        assert_eq!(plan.address_nets(0), ["A0", "VSS", "VSS"]);
        Ok(())
    }

    /// Evaluates the static logic value of every net in `module`.
    fn evaluate(lib: &NetlistCtx, module: &Module, inputs: HashMap<String, bool>) -> HashMap<String, bool> {
        let mut nets = inputs;
        for inst in module.instances() {
            let child = lib.module(&inst.cell).expect("child is registered");
            let ports = child.port_names().map(|p| p.to_string()).collect::<Vec<_>>();
            let value = |port: &str, nets: &HashMap<String, bool>| {
                let idx = ports.iter().position(|p| p == port).expect("port exists");
                *nets
                    .get(inst.conns[idx].as_str())
                    .unwrap_or_else(|| panic!("net {} is undriven", inst.conns[idx]))
            };
            let z = ports.iter().position(|p| p == "Z");
            if inst.cell.starts_with("PINV") {
                let out = !value("A", &nets);
                nets.insert(inst.conns[z.unwrap()].to_string(), out);
            } else if inst.cell.starts_with("PNAND2") {
                let out = !(value("A", &nets) && value("B", &nets));
                nets.insert(inst.conns[z.unwrap()].to_string(), out);
            } else if inst.cell.starts_with("PNAND3") {
                let out = !(value("A", &nets) && value("B", &nets) && value("C", &nets));
                nets.insert(inst.conns[z.unwrap()].to_string(), out);
            } else {
                let child_inputs = ports
                    .iter()
                    .zip(inst.conns.iter())
                    .filter_map(|(port, net)| nets.get(net.as_str()).map(|&v| (port.clone(), v)))
                    .collect();
                let child_nets = evaluate(lib, child, child_inputs);
                for (port, net) in ports.iter().zip(inst.conns.iter()) {
                    if let Some(&v) = child_nets.get(port) {
                        nets.insert(net.to_string(), v);
                    }
                }
            }
        }
        nets
    }

    fn check_one_hot(num_rows: usize) -> Result<()> {
        let mut lib = NetlistCtx::new();
        let params = DecoderParams::new(num_rows, DeviceModels::default());
        let name = lib.generate::<DecoderCascade>(&params)?;
        let plan = DecoderPlan::new(num_rows)?;
        let cascade = lib.module(&name).expect("cascade is registered").clone();

        for row in 0..num_rows {
            let mut inputs = HashMap::from([("VDD".to_string(), true), ("VSS".to_string(), false)]);
            for bit in 0..plan.n_bits {
                inputs.insert(format!("A{bit}"), (row >> bit) & 1 == 1);
            }
            let nets = evaluate(&lib, &cascade, inputs);
            for wl in 0..num_rows {
                assert_eq!(
                    nets.get(&format!("WL{wl}")).copied(),
                    Some(wl == row),
                    "address {row} on WL{wl}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_decoder_3_8_logic() -> Result<()> {
        let mut lib = NetlistCtx::new();
        lib.generate::<Decoder3To8>(&AndParams::new(DeviceModels::default()))?;
        let dec = lib.module("DECODER3_8").expect("decoder is registered").clone();
        let ports = dec.port_names().map(|p| p.as_str()).collect::<Vec<_>>();
        assert_eq!(&ports[..6], ["VDD", "VSS", "EN", "A2", "A1", "A0"]);
        assert_eq!(ports.len(), 14);

        for en in [false, true] {
            for addr in 0..8usize {
                let mut inputs = HashMap::from([
                    ("VDD".to_string(), true),
                    ("VSS".to_string(), false),
                    ("EN".to_string(), en),
                ]);
                for bit in 0..3 {
                    inputs.insert(format!("A{bit}"), (addr >> bit) & 1 == 1);
                }
                let nets = evaluate(&lib, &dec, inputs);
                for i in 0..8 {
                    assert_eq!(nets[&format!("WL{i}")], en && i == addr);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_cascade_is_one_hot() -> Result<()> {
        for rows in [1, 2, 9, 16, 64, 70] {
            check_one_hot(rows)?;
        }
        Ok(())
    }

    #[test]
    fn test_decoder_cascade_64() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let work_dir = test_work_dir("test_decoder_cascade_64");
        let params = DecoderParams::new(64, DeviceModels::default());
        let name = lib.write_schematic_to_file::<DecoderCascade>(&params, out_spice(&work_dir, "netlist"))?;
        assert_eq!(name, "DECODER_CASCADE_64");

        let cascade = lib.module(&name).expect("cascade is registered");
        assert_eq!(cascade.ports.len(), 2 + 6 + 64);
        assert_eq!(cascade.instances().count(), 9);
        let root = cascade.instance("DEC_0_0").expect("root block");
        assert_eq!(&root.conns[..6], ["VDD", "VSS", "VDD", "A5", "A4", "A3"]);
        let leaf = cascade.instance("DEC_1_7").expect("leaf block");
        assert_eq!(leaf.conns[2], "EN_0_0_7");
        assert_eq!(leaf.conns[13], "WL63");
        Ok(())
    }

    #[test]
    fn test_decoder_cascade_rc() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let params = DecoderParams::new(9, DeviceModels::default()).with_rc(Some(PiRc::default()));
        lib.generate::<DecoderCascade>(&params)?;
        let dec = lib.module("DECODER3_8").expect("decoder is registered");
        let and_cells = dec
            .instances()
            .filter(|i| i.name.starts_with("AND"))
            .map(|i| i.cell.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(and_cells, HashSet::from(["AND3_RC", "AND2_RC"]));
        Ok(())
    }

    #[test]
    fn test_symbolic_decoder() -> Result<()> {
        let mut lib = NetlistCtx::new();
        let params = DecoderParams::new(4, DeviceModels::default()).resolve(SizingMode::Symbolic);
        lib.generate::<DecoderCascade>(&params)?;
        let nand = lib.module("PNAND3").expect("nand3 is registered");
        assert!(nand
            .mosfets()
            .all(|m| m.length.to_string() == "'length_decoder'"));
        Ok(())
    }
}
