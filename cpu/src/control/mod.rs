//! Emulates the processor of the PDP-8/L.
//!
//! The processor works in major states.  Each call to
//! [`ControlUnit::single_step`] carries the machine through one of
//! them:
//!
//! | State   | What happens | Next state |
//! | ------- | ------------ | ---------- |
//! | Idle    | nothing (after LOAD ADDRESS, DEPOSIT, EXAMINE or reset) | Fetch |
//! | Fetch   | poll the teletype; take an interrupt, or read the instruction at IF:PC and advance PC.  Direct JMP, IOT and OPR complete here. | Fetch, Defer or Execute |
//! | Defer   | read the pointer (incrementing it first in locations 10-17); an indirect JMP completes here | Fetch or Execute |
//! | Execute | AND, TAD, ISZ, DCA or JMS on the operand | Fetch |
//!
//! Direct memory references use the instruction field.  References
//! through a pointer use the data field, except that JMS always
//! stores into the instruction field it jumps to.
use std::time::Duration;

use serde::Serialize;
use tracing::{event, Level};

use base::instruction::{disassemble, Instruction, MemoryReferenceKind, OperandAddress};
use base::prelude::*;

use crate::io::Teletype;
use crate::memory::MemoryUnit;

mod interrupt;
mod op_io;
mod op_memref;
mod op_operate;


pub use interrupt::FieldInterruptController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MajorState {
    Idle,
    Fetch,
    Defer,
    Execute,
}

/// Whether the processor should keep running after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// A HLT instruction was executed.
    Halted,
}

/// The registers visible on the front panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Registers {
    pub ac: Unsigned12Bit,
    pub link: bool,
    pub pc: Unsigned12Bit,
    pub ma: Unsigned12Bit,
    pub mb: Unsigned12Bit,
    /// Field of the most recent memory reference.
    pub ea: Unsigned3Bit,
    pub sr: Unsigned12Bit,
    /// The opcode (top three bits) of the current instruction.
    pub ir: Unsigned3Bit,
}

#[derive(Debug)]
pub struct ControlUnit {
    regs: Registers,
    fields: FieldInterruptController,
    state: MajorState,
    /// The instruction most recently fetched.
    current: Instruction,
    /// The address it was fetched from.
    fetched_from: Unsigned12Bit,
    trace: bool,
}

impl ControlUnit {
    pub fn new(trace: bool) -> ControlUnit {
        ControlUnit {
            regs: Registers::default(),
            fields: FieldInterruptController::new(),
            state: MajorState::Idle,
            current: Instruction::decode(Unsigned12Bit::ZERO),
            fetched_from: Unsigned12Bit::ZERO,
            trace,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn fields(&self) -> &FieldInterruptController {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldInterruptController {
        &mut self.fields
    }

    pub fn state(&self) -> MajorState {
        self.state
    }

    /// Return to the Idle state, so that the next step begins with a
    /// fetch.  The front panel keys do this.
    pub fn go_idle(&mut self) {
        self.state = MajorState::Idle;
    }

    /// A memory cycle.  MA, MB and EA follow every reference, which is
    /// why the panel lights show the last reference.
    fn read_memory(
        &mut self,
        mem: &mut MemoryUnit,
        field: Unsigned3Bit,
        address: Unsigned12Bit,
    ) -> Unsigned12Bit {
        let word = mem.read(field, address);
        self.regs.ea = field;
        self.regs.ma = address;
        self.regs.mb = word;
        word
    }

    fn write_memory(
        &mut self,
        mem: &mut MemoryUnit,
        field: Unsigned3Bit,
        address: Unsigned12Bit,
        word: Unsigned12Bit,
    ) {
        mem.write(field, address, word);
        self.regs.ea = field;
        self.regs.ma = address;
        self.regs.mb = word;
    }

    /// Read a word on behalf of the front panel (EXAMINE, LOAD
    /// ADDRESS).
    pub fn panel_read(
        &mut self,
        mem: &mut MemoryUnit,
        field: Unsigned3Bit,
        address: Unsigned12Bit,
    ) -> Unsigned12Bit {
        self.read_memory(mem, field, address)
    }

    /// Write a word on behalf of the front panel (DEPOSIT).
    pub fn panel_write(
        &mut self,
        mem: &mut MemoryUnit,
        field: Unsigned3Bit,
        address: Unsigned12Bit,
        word: Unsigned12Bit,
    ) {
        self.write_memory(mem, field, address, word)
    }

    fn skip(&mut self) {
        self.regs.pc = self.regs.pc.successor();
    }

    /// Carry the processor through one major state.
    pub fn single_step(
        &mut self,
        mem: &mut MemoryUnit,
        tty: &mut Teletype,
        now: Duration,
    ) -> StepOutcome {
        match self.state {
            MajorState::Idle | MajorState::Execute => self.fetch(mem, tty, now),
            MajorState::Fetch => {
                if self.current.completes_in_fetch() {
                    return self.fetch(mem, tty, now);
                }
                let operand = match self.current {
                    Instruction::MemoryReference { operand, .. } | Instruction::Jump { operand } => {
                        operand
                    }
                    // Anything else completed in the fetch cycle.
                    Instruction::Iot { .. } | Instruction::Operate(_) => unreachable!(),
                };
                let address = operand.resolve(self.fetched_from);
                if operand.is_indirect() {
                    self.defer(mem, address);
                } else {
                    let field = self.fields.instruction_field();
                    self.execute(mem, field, address);
                }
                StepOutcome::Continue
            }
            MajorState::Defer => {
                if let Instruction::Jump { .. } = self.current {
                    // The jump happened at the end of the defer cycle.
                    return self.fetch(mem, tty, now);
                }
                let field = self.fields.data_field();
                let address = self.regs.mb;
                self.execute(mem, field, address);
                StepOutcome::Continue
            }
        }
    }

    fn trace_line(&self, what: &str) {
        if self.trace {
            event!(
                Level::INFO,
                "PC={:o}.{:04o}  L.AC={:o}.{:04o}  IF={:o}  DF={:o}  {}",
                self.regs.ea,
                self.regs.ma,
                u8::from(self.regs.link),
                self.regs.ac,
                self.fields.instruction_field(),
                self.fields.data_field(),
                what,
            );
        }
    }

    fn fetch(&mut self, mem: &mut MemoryUnit, tty: &mut Teletype, now: Duration) -> StepOutcome {
        tty.poll(now);
        if self.fields.acknowledge_if_pending(tty.interrupt_request()) {
            if self.trace {
                event!(
                    Level::INFO,
                    "PC={:o}.{:04o}  L.AC={:o}.{:04o}  IF={:o}  DF={:o}  interrupt",
                    self.fields.saved_instruction_field(),
                    self.regs.pc,
                    u8::from(self.regs.link),
                    self.regs.ac,
                    self.fields.saved_instruction_field(),
                    self.fields.saved_data_field(),
                );
            }
            // The interrupt is a JMS to location 0 of field 0.
            self.state = MajorState::Execute;
            let pc = self.regs.pc;
            self.write_memory(mem, Unsigned3Bit::ZERO, Unsigned12Bit::ZERO, pc);
            self.regs.pc = Unsigned12Bit::ONE;
            return StepOutcome::Continue;
        }
        self.fields.latch_interrupt_enable();

        self.state = MajorState::Fetch;
        let field = self.fields.instruction_field();
        let address = self.regs.pc;
        let word = self.read_memory(mem, field, address);
        self.regs.ir = word.top_three_bits();
        self.regs.pc = address.successor();
        self.fetched_from = address;
        self.current = Instruction::decode(word);
        if self.current.is_jump_class() {
            self.fields.clear_inhibit();
        }
        if self.trace {
            self.trace_line(&format!("IR={:04o}  {}", word, disassemble(word, address)));
        }

        match self.current {
            Instruction::Jump { operand } if !operand.is_indirect() => {
                self.op_jmp(&operand);
                StepOutcome::Continue
            }
            Instruction::Iot { code } => {
                self.op_iot(code, tty);
                StepOutcome::Continue
            }
            Instruction::Operate(op) => self.op_operate(&op),
            Instruction::Jump { .. } | Instruction::MemoryReference { .. } => {
                StepOutcome::Continue
            }
        }
    }

    /// The defer cycle: fetch the pointer at `address` in the
    /// instruction field.
    fn defer(&mut self, mem: &mut MemoryUnit, address: Unsigned12Bit) {
        self.state = MajorState::Defer;
        let field = self.fields.instruction_field();
        let pointer = self.read_memory(mem, field, address);
        if ExtendedAddress::new(field, address).is_auto_index() {
            // Auto-index: the incremented pointer is stored back and
            // is also the one used (it is left in MB).
            let incremented = pointer.successor();
            self.write_memory(mem, field, address, incremented);
        }
        if let Instruction::Jump { .. } = self.current {
            self.fields.jump_taken();
            self.regs.pc = self.regs.mb;
        }
    }

    fn op_jmp(&mut self, operand: &OperandAddress) {
        self.fields.jump_taken();
        self.regs.pc = operand.resolve(self.fetched_from);
    }

    fn execute(&mut self, mem: &mut MemoryUnit, field: Unsigned3Bit, address: Unsigned12Bit) {
        self.state = MajorState::Execute;
        match self.current {
            Instruction::MemoryReference { kind, .. } => match kind {
                MemoryReferenceKind::And => self.op_and(mem, field, address),
                MemoryReferenceKind::Tad => self.op_tad(mem, field, address),
                MemoryReferenceKind::Isz => self.op_isz(mem, field, address),
                MemoryReferenceKind::Dca => self.op_dca(mem, field, address),
                MemoryReferenceKind::Jms => self.op_jms(mem, address),
            },
            // JMP never reaches an execute cycle, and IOT and OPR are
            // done during fetch.
            Instruction::Jump { .. } | Instruction::Iot { .. } | Instruction::Operate(_) => {
                unreachable!("no execute cycle for {:?}", self.current)
            }
        }
    }
}
