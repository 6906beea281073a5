/// Human-oriented formatting for instructions.
use std::fmt::{self, Display, Formatter};

use crate::instruction::{
    Group1, Group2, Instruction, MemoryReferenceKind, Operate, OperandAddress, Rotate,
};
use crate::prelude::*;

impl Display for MemoryReferenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(match self {
            MemoryReferenceKind::And => "AND",
            MemoryReferenceKind::Tad => "TAD",
            MemoryReferenceKind::Isz => "ISZ",
            MemoryReferenceKind::Dca => "DCA",
            MemoryReferenceKind::Jms => "JMS",
        })
    }
}

/// Names of the IOT instructions implemented by the simulated
/// PDP-8/L (processor, teletype and memory extension).
fn iot_name(code: Unsigned12Bit) -> Option<String> {
    let name = match code.bits() {
        0o6001 => "ION",
        0o6002 => "IOF",
        0o6031 => "KSF",
        0o6032 => "KCC",
        0o6034 => "KRS",
        0o6035 => "KIE",
        0o6036 => "KRB",
        0o6041 => "TSF",
        0o6042 => "TCF",
        0o6044 => "TPC",
        0o6045 => "TSK",
        0o6046 => "TLS",
        0o6214 => "RDF",
        0o6224 => "RIF",
        0o6234 => "RIB",
        0o6244 => "RMF",
        bits if bits & 0o7700 == 0o6200 && bits & 0o4 == 0 && bits & 0o3 != 0 => {
            // CDF/CIF take the field shifted into bits 5..3, which
            // is how DEC assemblers write the operand (CDF 10 selects
            // field 1).
            let field = code.middle_field_bits().shifted_into_bits_5_to_3();
            let mnemonic = match bits & 0o3 {
                1 => "CDF",
                2 => "CIF",
                _ => "CDF CIF",
            };
            return Some(format!("{mnemonic} {field:o}"));
        }
        _ => return None,
    };
    Some(name.to_string())
}

fn group1_names(g: &Group1) -> Vec<&'static str> {
    let mut names = Vec::new();
    if g.cla {
        names.push("CLA");
    }
    if g.cll {
        names.push("CLL");
    }
    if g.cma {
        names.push("CMA");
    }
    if g.cml {
        names.push("CML");
    }
    match g.rotate {
        Rotate::None | Rotate::Conflicting(_) => (),
        Rotate::ByteSwap => names.push("BSW"),
        Rotate::Left => names.push("RAL"),
        Rotate::LeftTwice => names.push("RTL"),
        Rotate::Right => names.push("RAR"),
        Rotate::RightTwice => names.push("RTR"),
    }
    if g.iac {
        names.push("IAC");
    }
    names
}

fn group2_names(g: &Group2) -> Vec<&'static str> {
    let mut names = Vec::new();
    if g.reverse {
        if g.sma {
            names.push("SPA");
        }
        if g.sza {
            names.push("SNA");
        }
        if g.snl {
            names.push("SZL");
        }
        if !(g.sma || g.sza || g.snl) {
            names.push("SKP");
        }
    } else {
        if g.sma {
            names.push("SMA");
        }
        if g.sza {
            names.push("SZA");
        }
        if g.snl {
            names.push("SNL");
        }
    }
    if g.cla {
        names.push("CLA");
    }
    if g.osr {
        names.push("OSR");
    }
    if g.hlt {
        names.push("HLT");
    }
    names
}

fn format_operand(
    kind: &dyn Display,
    operand: &OperandAddress,
    address: Unsigned12Bit,
) -> String {
    let target = operand.resolve(address);
    if operand.is_indirect() {
        format!("{kind} I {target:04o}")
    } else {
        format!("{kind} {target:04o}")
    }
}

/// Disassemble the instruction `word`, which was fetched from
/// `address`.  The address is needed to turn current-page operands
/// into absolute addresses.  Words with no conventional mnemonic are
/// shown in octal.
///
/// # Examples
///
/// ```
/// use base::prelude::*;
/// assert_eq!(disassemble(u12!(0o1410), u12!(0o200)), "TAD I 0010");
/// assert_eq!(disassemble(u12!(0o7300), u12!(0o200)), "CLA CLL");
/// ```
pub fn disassemble(word: Unsigned12Bit, address: Unsigned12Bit) -> String {
    let names: Vec<&'static str> = match Instruction::decode(word) {
        Instruction::MemoryReference { kind, operand } => {
            return format_operand(&kind, &operand, address);
        }
        Instruction::Jump { operand } => {
            return format_operand(&"JMP", &operand, address);
        }
        Instruction::Iot { code } => {
            return iot_name(code).unwrap_or_else(|| format!("IOT {code:04o}"));
        }
        Instruction::Operate(Operate::Group1(g)) => {
            if let Rotate::Conflicting(_) = g.rotate {
                return format!("OPR {word:04o}");
            }
            let names = group1_names(&g);
            if names.is_empty() {
                return "NOP".to_string();
            }
            names
        }
        Instruction::Operate(Operate::Group2(g)) => {
            let names = group2_names(&g);
            if names.is_empty() {
                // 7400 has no effect at all.
                return "NOP".to_string();
            }
            names
        }
        Instruction::Operate(Operate::Undefined(_)) => {
            return format!("OPR {word:04o}");
        }
    };
    names.join(" ")
}
