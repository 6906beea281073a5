//! Decoding of PDP-8 instruction words.
//!
//! Every 12-bit word is a valid instruction (though some of them do
//! nothing useful on a PDP-8/L) so [`Instruction::decode`] cannot
//! fail.  The top three bits select the instruction class:
//!
//! | Opcode | Class |
//! | ------ | ----- |
//! | 0..=4  | memory reference (AND, TAD, ISZ, DCA, JMS) |
//! | 5      | JMP |
//! | 6      | IOT |
//! | 7      | OPR (operate) |
//!
//! Memory reference instructions and JMP share the same operand
//! format: bit 8 (0o400) selects indirect addressing, bit 7 (0o200)
//! selects the current page instead of page zero, and bits 6..0 are
//! the offset within the page.

#[cfg(test)]
use test_strategy::proptest;

use serde::Serialize;

use super::prelude::*;

mod format;
pub use format::disassemble;

const INDIRECT_BIT: u16 = 0o400;
const CURRENT_PAGE_BIT: u16 = 0o200;
const PAGE_MASK: u16 = 0o7600;
const OFFSET_MASK: u16 = 0o177;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MemoryReferenceKind {
    And,
    Tad,
    Isz,
    Dca,
    Jms,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    Zero,
    Current,
}

/// The operand of a memory reference instruction or JMP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct OperandAddress {
    indirect: bool,
    page: Page,
    offset: Unsigned7Bit,
}

impl OperandAddress {
    fn from_word(word: Unsigned12Bit) -> OperandAddress {
        let bits = word.bits();
        OperandAddress {
            indirect: bits & INDIRECT_BIT != 0,
            page: if bits & CURRENT_PAGE_BIT != 0 {
                Page::Current
            } else {
                Page::Zero
            },
            offset: Unsigned7Bit::truncating((bits & OFFSET_MASK) as u8),
        }
    }

    pub fn is_indirect(&self) -> bool {
        self.indirect
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn offset(&self) -> Unsigned7Bit {
        self.offset
    }

    /// Compute the address this operand refers to, given the address
    /// from which the instruction itself was fetched.  For an
    /// indirect operand, this is the address of the pointer.
    pub fn resolve(&self, instruction_address: Unsigned12Bit) -> Unsigned12Bit {
        let offset = Unsigned12Bit::from(self.offset);
        match self.page {
            Page::Zero => offset,
            Page::Current => (instruction_address & PAGE_MASK) | offset,
        }
    }
}

/// The rotate field (bits 3..1) of an OPR group 1 instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Rotate {
    None,
    /// BSW: exchange the two 6-bit halves of AC.
    ByteSwap,
    /// RAL: rotate L.AC left one place.
    Left,
    /// RTL: rotate L.AC left two places.
    LeftTwice,
    /// RAR: rotate L.AC right one place.
    Right,
    /// RTR: rotate L.AC right two places.
    RightTwice,
    /// RAL and RAR together (with or without the "twice" bit).  The
    /// PDP-8/L does not define a result for these.
    Conflicting(Unsigned3Bit),
}

impl Rotate {
    fn from_code(code: Unsigned3Bit) -> Rotate {
        match u8::from(code) {
            0 => Rotate::None,
            1 => Rotate::ByteSwap,
            2 => Rotate::Left,
            3 => Rotate::LeftTwice,
            4 => Rotate::Right,
            5 => Rotate::RightTwice,
            _ => Rotate::Conflicting(code),
        }
    }
}

/// OPR group 1 micro-instructions.  The hardware performs these in
/// the order clear, complement, rotate, increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Group1 {
    pub cla: bool,
    pub cll: bool,
    pub cma: bool,
    pub cml: bool,
    pub rotate: Rotate,
    pub iac: bool,
}

/// OPR group 2 micro-instructions.  The skip conditions SMA, SZA
/// and SNL are ORed together; when `reverse` is set the result is
/// inverted (giving SPA, SNA, SZL and their AND).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Group2 {
    pub sma: bool,
    pub sza: bool,
    pub snl: bool,
    pub reverse: bool,
    pub cla: bool,
    pub osr: bool,
    pub hlt: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Operate {
    Group1(Group1),
    Group2(Group2),
    /// Group 3 (EAE) and group 2 words with bit 0 set.  The PDP-8/L
    /// has no EAE, so these have no defined effect.
    Undefined(Unsigned12Bit),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Instruction {
    MemoryReference {
        kind: MemoryReferenceKind,
        operand: OperandAddress,
    },
    Jump {
        operand: OperandAddress,
    },
    Iot {
        code: Unsigned12Bit,
    },
    Operate(Operate),
}

impl Instruction {
    pub fn decode(word: Unsigned12Bit) -> Instruction {
        let bits = word.bits();
        let memref = |kind| Instruction::MemoryReference {
            kind,
            operand: OperandAddress::from_word(word),
        };
        match u8::from(word.top_three_bits()) {
            0 => memref(MemoryReferenceKind::And),
            1 => memref(MemoryReferenceKind::Tad),
            2 => memref(MemoryReferenceKind::Isz),
            3 => memref(MemoryReferenceKind::Dca),
            4 => memref(MemoryReferenceKind::Jms),
            5 => Instruction::Jump {
                operand: OperandAddress::from_word(word),
            },
            6 => Instruction::Iot { code: word },
            7 => Instruction::Operate(if bits & 0o400 == 0 {
                Operate::Group1(Group1 {
                    cla: bits & 0o200 != 0,
                    cll: bits & 0o100 != 0,
                    cma: bits & 0o040 != 0,
                    cml: bits & 0o020 != 0,
                    rotate: Rotate::from_code(Unsigned3Bit::truncating(((bits >> 1) & 0o7) as u8)),
                    iac: bits & 0o001 != 0,
                })
            } else if bits & 0o001 == 0 {
                Operate::Group2(Group2 {
                    cla: bits & 0o200 != 0,
                    sma: bits & 0o100 != 0,
                    sza: bits & 0o040 != 0,
                    snl: bits & 0o020 != 0,
                    reverse: bits & 0o010 != 0,
                    osr: bits & 0o004 != 0,
                    hlt: bits & 0o002 != 0,
                })
            } else {
                Operate::Undefined(word)
            }),
            // top_three_bits() only has three bits.
            _ => unreachable!(),
        }
    }

    /// Returns true for JMS and JMP, the instructions which load the
    /// instruction field from the field-after-jump register.
    pub fn is_jump_class(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. }
                | Instruction::MemoryReference {
                    kind: MemoryReferenceKind::Jms,
                    ..
                }
        )
    }

    /// Returns true when the whole of the instruction is carried out
    /// within its fetch cycle (direct JMP, IOT and OPR).
    pub fn completes_in_fetch(&self) -> bool {
        match self {
            Instruction::Jump { operand } => !operand.is_indirect(),
            Instruction::Iot { .. } | Instruction::Operate(_) => true,
            Instruction::MemoryReference { .. } => false,
        }
    }
}

#[test]
fn test_decode_memory_reference() {
    // TAD I 10, on page 1.
    match Instruction::decode(u12!(0o1410)) {
        Instruction::MemoryReference {
            kind: MemoryReferenceKind::Tad,
            operand,
        } => {
            assert!(operand.is_indirect());
            assert_eq!(operand.page(), Page::Zero);
            assert_eq!(operand.resolve(u12!(0o0234)), u12!(0o0010));
        }
        other => panic!("unexpected decode {other:?}"),
    }
}

#[test]
fn test_current_page_operand() {
    // JMP to offset 3 of the current page.
    match Instruction::decode(u12!(0o5203)) {
        Instruction::Jump { operand } => {
            assert!(!operand.is_indirect());
            assert_eq!(operand.page(), Page::Current);
            assert_eq!(operand.resolve(u12!(0o1377)), u12!(0o1203));
            assert_eq!(operand.resolve(u12!(0o0200)), u12!(0o0203));
        }
        other => panic!("unexpected decode {other:?}"),
    }
}

#[test]
fn test_decode_iot() {
    assert_eq!(
        Instruction::decode(u12!(0o6046)),
        Instruction::Iot { code: u12!(0o6046) }
    );
}

#[test]
fn test_decode_group1() {
    // CLA CLL CMA IAC RAL
    let inst = Instruction::decode(u12!(0o7345));
    assert_eq!(
        inst,
        Instruction::Operate(Operate::Group1(Group1 {
            cla: true,
            cll: true,
            cma: true,
            cml: false,
            rotate: Rotate::Left,
            iac: true,
        }))
    );
    match Instruction::decode(u12!(0o7014)) {
        Instruction::Operate(Operate::Group1(g)) => {
            assert_eq!(g.rotate, Rotate::Conflicting(u3!(6)));
        }
        other => panic!("unexpected decode {other:?}"),
    }
    match Instruction::decode(u12!(0o7002)) {
        Instruction::Operate(Operate::Group1(g)) => assert_eq!(g.rotate, Rotate::ByteSwap),
        other => panic!("unexpected decode {other:?}"),
    }
}

#[test]
fn test_decode_group2() {
    // SZA SNL CLA
    assert_eq!(
        Instruction::decode(u12!(0o7660)),
        Instruction::Operate(Operate::Group2(Group2 {
            sma: false,
            sza: true,
            snl: true,
            reverse: false,
            cla: true,
            osr: false,
            hlt: false,
        }))
    );
    match Instruction::decode(u12!(0o7402)) {
        Instruction::Operate(Operate::Group2(g)) => assert!(g.hlt),
        other => panic!("unexpected decode {other:?}"),
    }
    assert_eq!(
        Instruction::decode(u12!(0o7421)),
        Instruction::Operate(Operate::Undefined(u12!(0o7421)))
    );
}

#[test]
fn test_completes_in_fetch() {
    assert!(Instruction::decode(u12!(0o5200)).completes_in_fetch());
    assert!(!Instruction::decode(u12!(0o5600)).completes_in_fetch());
    assert!(Instruction::decode(u12!(0o6001)).completes_in_fetch());
    assert!(Instruction::decode(u12!(0o7000)).completes_in_fetch());
    assert!(!Instruction::decode(u12!(0o3010)).completes_in_fetch());
    assert!(Instruction::decode(u12!(0o4100)).is_jump_class());
    assert!(Instruction::decode(u12!(0o5100)).is_jump_class());
    assert!(!Instruction::decode(u12!(0o2100)).is_jump_class());
}

#[cfg(test)]
#[proptest]
fn decode_is_total(#[strategy(0..=0o7777_u16)] bits: u16) {
    let word = Unsigned12Bit::try_from(bits).unwrap();
    let inst = Instruction::decode(word);
    match (bits >> 9, inst) {
        (0..=4, Instruction::MemoryReference { operand, .. })
        | (5, Instruction::Jump { operand }) => {
            assert_eq!(operand.is_indirect(), bits & 0o400 != 0);
            assert_eq!(u16::from(operand.offset()), bits & 0o177);
        }
        (6, Instruction::Iot { code }) => assert_eq!(code, word),
        (7, Instruction::Operate(_)) => (),
        (_, other) => panic!("{bits:04o} decoded as {other:?}"),
    }
}
