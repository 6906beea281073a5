use base::prelude::*;

use crate::control::ControlUnit;
use crate::memory::MemoryUnit;

/// ## Memory reference instructions
///
/// - AND: [`ControlUnit::op_and`]
/// - TAD: [`ControlUnit::op_tad`]
/// - ISZ: [`ControlUnit::op_isz`]
/// - DCA: [`ControlUnit::op_dca`]
/// - JMS: [`ControlUnit::op_jms`]
///
/// JMP is handled as part of the fetch or defer cycle.
impl ControlUnit {
    /// AC := AC & operand.
    pub(super) fn op_and(&mut self, mem: &mut MemoryUnit, field: Unsigned3Bit, address: Unsigned12Bit) {
        let operand = self.read_memory(mem, field, address);
        self.regs.ac = self.regs.ac & operand;
    }

    /// Two's complement add into AC.  A carry out of AC complements
    /// the link.
    pub(super) fn op_tad(&mut self, mem: &mut MemoryUnit, field: Unsigned3Bit, address: Unsigned12Bit) {
        let operand = self.read_memory(mem, field, address);
        let (sum, carry) = self.regs.ac.overflowing_add(operand);
        self.regs.ac = sum;
        self.regs.link ^= carry;
    }

    /// Increment the operand, and skip if the result is zero.
    pub(super) fn op_isz(&mut self, mem: &mut MemoryUnit, field: Unsigned3Bit, address: Unsigned12Bit) {
        let incremented = self.read_memory(mem, field, address).successor();
        self.write_memory(mem, field, address, incremented);
        if incremented.is_zero() {
            self.skip();
        }
    }

    /// Deposit AC in memory and clear AC.
    pub(super) fn op_dca(&mut self, mem: &mut MemoryUnit, field: Unsigned3Bit, address: Unsigned12Bit) {
        let ac = self.regs.ac;
        self.write_memory(mem, field, address, ac);
        self.regs.ac = Unsigned12Bit::ZERO;
    }

    /// Jump to subroutine: store the return address at the target
    /// (in the new instruction field) and continue after it.
    pub(super) fn op_jms(&mut self, mem: &mut MemoryUnit, address: Unsigned12Bit) {
        self.fields.jump_taken();
        let field = self.fields.instruction_field();
        let pc = self.regs.pc;
        self.write_memory(mem, field, address, pc);
        self.regs.pc = address.successor();
    }
}
