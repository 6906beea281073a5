use tracing::{event, Level};

use base::instruction::{Group1, Group2, Operate, Rotate};
use base::prelude::*;

use crate::control::{ControlUnit, StepOutcome};

const LINK_BIT: u16 = 0o10000;
const LINK_AC_MASK: u16 = 0o17777;

/// Rotate the 13-bit quantity L.AC by `places` (positive for left).
fn rotate_link_ac(link: bool, ac: Unsigned12Bit, left: bool, places: u32) -> (bool, Unsigned12Bit) {
    let mut value: u16 = ac.bits() | if link { LINK_BIT } else { 0 };
    for _ in 0..places {
        value = if left {
            ((value << 1) | (value >> 12)) & LINK_AC_MASK
        } else {
            ((value >> 1) | ((value & 1) << 12)) & LINK_AC_MASK
        };
    }
    (value & LINK_BIT != 0, Unsigned12Bit::truncating(value))
}

/// ## Operate instructions
///
/// Group 1 performs its micro-operations in a fixed order: CLA and
/// CLL, then CMA and CML, then the rotate, then IAC.  Group 2 tests
/// the skip conditions before CLA, then applies CLA, OSR and HLT.
impl ControlUnit {
    pub(super) fn op_operate(&mut self, op: &Operate) -> StepOutcome {
        match op {
            Operate::Group1(g) => {
                self.op_group1(g);
                StepOutcome::Continue
            }
            Operate::Group2(g) => self.op_group2(g),
            Operate::Undefined(word) => {
                event!(
                    Level::WARN,
                    "operate instruction {:04o} at {:o}.{:04o} is not implemented on the PDP-8/L; ignoring it",
                    word,
                    self.regs.ea,
                    self.fetched_from
                );
                StepOutcome::Continue
            }
        }
    }

    fn op_group1(&mut self, g: &Group1) {
        let regs = &mut self.regs;
        if g.cla {
            regs.ac = Unsigned12Bit::ZERO;
        }
        if g.cll {
            regs.link = false;
        }
        if g.cma {
            regs.ac = !regs.ac;
        }
        if g.cml {
            regs.link = !regs.link;
        }
        match g.rotate {
            Rotate::None => (),
            Rotate::ByteSwap => {
                regs.ac = regs.ac.rotate_left(6);
            }
            Rotate::Left | Rotate::LeftTwice | Rotate::Right | Rotate::RightTwice => {
                let left = matches!(g.rotate, Rotate::Left | Rotate::LeftTwice);
                let places = if matches!(g.rotate, Rotate::LeftTwice | Rotate::RightTwice) {
                    2
                } else {
                    1
                };
                let (link, ac) = rotate_link_ac(regs.link, regs.ac, left, places);
                regs.link = link;
                regs.ac = ac;
            }
            Rotate::Conflicting(code) => {
                event!(
                    Level::WARN,
                    "OPR group 1 rotate code {:o} at {:o}.{:04o} selects both directions; not rotating",
                    code,
                    regs.ea,
                    self.fetched_from
                );
            }
        }
        if g.iac {
            let (sum, carry) = regs.ac.overflowing_add(Unsigned12Bit::ONE);
            regs.ac = sum;
            regs.link ^= carry;
        }
    }

    fn op_group2(&mut self, g: &Group2) -> StepOutcome {
        let regs = &mut self.regs;
        let mut skip = (g.sma && regs.ac.bit(11)) || (g.sza && regs.ac.is_zero()) || (g.snl && regs.link);
        if g.reverse {
            skip = !skip;
        }
        if skip {
            regs.pc = regs.pc.successor();
        }
        if g.cla {
            regs.ac = Unsigned12Bit::ZERO;
        }
        if g.osr {
            regs.ac = regs.ac | regs.sr;
        }
        if g.hlt {
            event!(
                Level::INFO,
                "HLT at {:o}.{:04o}",
                regs.ea,
                self.fetched_from
            );
            StepOutcome::Halted
        } else {
            StepOutcome::Continue
        }
    }
}

#[test]
fn test_rotate_link_ac() {
    // RAL moves AC bit 0 into the link and the link into AC bit 11.
    assert_eq!(
        rotate_link_ac(true, u12!(0o4000), true, 1),
        (true, u12!(0o0001))
    );
    assert_eq!(
        rotate_link_ac(false, u12!(0o4000), true, 1),
        (true, u12!(0o0000))
    );
    // RTR: AC bit 1 goes to the link, AC bit 0 and the old link to
    // AC bits 0 and 1.
    assert_eq!(
        rotate_link_ac(true, u12!(0o0003), false, 2),
        (true, u12!(0o6000))
    );
    // Thirteen single rotations are the identity.
    assert_eq!(
        rotate_link_ac(true, u12!(0o1234), true, 13),
        (true, u12!(0o1234))
    );
}
