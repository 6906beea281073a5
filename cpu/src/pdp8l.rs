//! The whole machine: processor, memory, teletype and front panel.
//!
//! [`Pdp8l`] is single-threaded.  [`crate::SimulatorRuntime`] wraps it
//! in a mutex and adds the worker thread which runs it.
use serde::Serialize;
use tracing::{event, Level};

use base::prelude::*;

use crate::clock::Clock;
use crate::config::SimulatorConfig;
use crate::control::{ControlUnit, MajorState, StepOutcome};
use crate::io::{Teletype, TeletypeStatus};
use crate::memory::MemoryUnit;
use crate::panel::{FrontPanel, KeyPresses, Lights, PinTable, PinVector, SwitchSettings};

/// A copy of the machine's registers, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterSnapshot {
    pub ac: Unsigned12Bit,
    pub link: bool,
    pub pc: Unsigned12Bit,
    pub ma: Unsigned12Bit,
    pub mb: Unsigned12Bit,
    pub sr: Unsigned12Bit,
    pub ir: Unsigned3Bit,
    pub instruction_field: Unsigned3Bit,
    pub data_field: Unsigned3Bit,
    pub instruction_field_after_jump: Unsigned3Bit,
    pub saved_instruction_field: Unsigned3Bit,
    pub saved_data_field: Unsigned3Bit,
    pub interrupts_enabled: bool,
    pub interrupt_requested: bool,
    pub running: bool,
    pub halted: bool,
    pub state: MajorState,
    pub teletype: TeletypeStatus,
}

/// What the caller of [`Pdp8l::accept_pins`] must do before the
/// pressed keys can be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub keys: KeyPresses,
    /// STOP was pressed (or STEP switched on) while running; the
    /// worker must be waited for.
    pub stop_requested: bool,
}

#[derive(Debug)]
pub struct Pdp8l {
    control: ControlUnit,
    mem: MemoryUnit,
    tty: Teletype,
    panel: FrontPanel,
    clock: Box<dyn Clock>,
    switches: SwitchSettings,
    running: bool,
    halted: bool,
}

impl Pdp8l {
    /// `config` must already have been validated.
    pub fn new(
        config: &SimulatorConfig,
        table: PinTable,
        tty: Teletype,
        clock: Box<dyn Clock>,
    ) -> Pdp8l {
        Pdp8l {
            control: ControlUnit::new(config.trace_enabled),
            mem: MemoryUnit::new(config.field_count),
            tty,
            panel: FrontPanel::new(table),
            clock,
            switches: SwitchSettings::default(),
            running: false,
            halted: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn stop_running(&mut self) {
        if self.running {
            event!(Level::DEBUG, "stopping");
            self.running = false;
        }
    }

    /// Advance the processor by one major state.  Does nothing after
    /// a HLT until CONTINUE or START is pressed.
    pub fn step(&mut self) -> StepOutcome {
        if self.halted {
            return StepOutcome::Halted;
        }
        let now = self.clock.now();
        let outcome = self.control.single_step(&mut self.mem, &mut self.tty, now);
        if outcome == StepOutcome::Halted {
            self.running = false;
            self.halted = true;
        }
        outcome
    }

    pub fn request_interrupt(&mut self) {
        self.control.fields_mut().request_interrupt();
    }

    /// Take in a new set of pin values.  The switches take effect
    /// immediately.  Key presses are returned, to be given to
    /// [`Pdp8l::press_keys`] once any running worker has stopped.
    pub fn accept_pins(&mut self, pins: &PinVector) -> PinWrite {
        let (switches, keys) = self.panel.accept(pins);
        self.switches = switches;
        self.control.registers_mut().sr = switches.switch_register;
        let stop_requested = self.running && (keys.stop || switches.step);
        if stop_requested {
            self.stop_running();
        }
        PinWrite {
            keys,
            stop_requested,
        }
    }

    /// Perform the front panel's one-shot operations.  Returns true if
    /// a worker should now be started to run the machine.
    pub fn press_keys(&mut self, keys: &KeyPresses) -> bool {
        if self.running {
            // Keys other than STOP do nothing while running.
            return false;
        }
        let field_switch = |on: bool| if on { Unsigned3Bit::ONE } else { Unsigned3Bit::ZERO };
        let sr = self.switches.switch_register;

        if keys.load_address {
            let df = field_switch(self.switches.data_field);
            let inst_field = field_switch(self.switches.inst_field);
            self.control.fields_mut().load_address(df, inst_field);
            self.control.registers_mut().pc = sr;
            self.control.panel_read(&mut self.mem, inst_field, sr);
            self.control.go_idle();
            event!(Level::DEBUG, "LOAD ADDRESS {:o}.{:04o}", inst_field, sr);
        }
        if keys.deposit {
            let df = self.control.fields().data_field();
            let pc = self.control.registers().pc;
            self.control.panel_write(&mut self.mem, df, pc, sr);
            self.control.registers_mut().pc = pc.successor();
            self.control.go_idle();
            event!(Level::DEBUG, "DEPOSIT {:04o} at {:o}.{:04o}", sr, df, pc);
        }
        if keys.examine {
            let df = self.control.fields().data_field();
            let pc = self.control.registers().pc;
            let word = self.control.panel_read(&mut self.mem, df, pc);
            let regs = self.control.registers_mut();
            regs.pc = regs.ma.successor();
            self.control.go_idle();
            event!(Level::DEBUG, "EXAMINE {:o}.{:04o} = {:04o}", df, pc, word);
        }
        if keys.start {
            let regs = self.control.registers_mut();
            regs.ac = Unsigned12Bit::ZERO;
            regs.link = false;
            self.control.go_idle();
            event!(Level::DEBUG, "START");
        }
        if keys.start || keys.cont {
            self.halted = false;
            if self.switches.step {
                self.step();
                false
            } else {
                event!(Level::DEBUG, "running");
                self.running = true;
                true
            }
        } else {
            false
        }
    }

    /// The pins as seen from outside: the switches as last written
    /// and the lights.
    pub fn read_pins(&self) -> PinVector {
        let regs = self.control.registers();
        let state = self.control.state();
        let last = self.mem.last_reference();
        let lights = Lights {
            accumulator: regs.ac,
            memory_address: last.address.address,
            memory_buffer: last.word,
            instruction_register: regs.ir,
            fetch: state == MajorState::Fetch,
            defer: state == MajorState::Defer,
            execute: state == MajorState::Execute,
            interrupt_on: self.control.fields().interrupts_enabled(),
            run: self.running,
            extended_address: last.address.field.bit(0),
            link: regs.link,
        };
        self.panel.render(&lights)
    }

    pub fn registers(&self) -> RegisterSnapshot {
        let regs = self.control.registers();
        let fields = self.control.fields();
        RegisterSnapshot {
            ac: regs.ac,
            link: regs.link,
            pc: regs.pc,
            ma: regs.ma,
            mb: regs.mb,
            sr: regs.sr,
            ir: regs.ir,
            instruction_field: fields.instruction_field(),
            data_field: fields.data_field(),
            instruction_field_after_jump: fields.instruction_field_after_jump(),
            saved_instruction_field: fields.saved_instruction_field(),
            saved_data_field: fields.saved_data_field(),
            interrupts_enabled: fields.interrupts_enabled(),
            interrupt_requested: fields.interrupt_requested(),
            running: self.running,
            halted: self.halted,
            state: self.control.state(),
            teletype: self.tty.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use base::prelude::*;

    use super::Pdp8l;
    use crate::clock::ManualClock;
    use crate::config::SimulatorConfig;
    use crate::control::{MajorState, StepOutcome};
    use crate::io::{Teletype, Unconnected};
    use crate::panel::{PinTable, PinVector, Signal};

    struct Console {
        machine: Pdp8l,
        table: PinTable,
        pins: PinVector,
    }

    impl Console {
        fn new() -> Console {
            let table = PinTable::standard();
            let tty = Teletype::new(10, Box::new(Unconnected), Box::new(Unconnected));
            let machine = Pdp8l::new(
                &SimulatorConfig::default(),
                table.clone(),
                tty,
                Box::new(ManualClock::new()),
            );
            let pins = PinVector::new(table.pin_count());
            Console {
                machine,
                table,
                pins,
            }
        }

        fn write(&mut self) -> bool {
            let write = self.machine.accept_pins(&self.pins);
            self.machine.press_keys(&write.keys)
        }

        fn set(&mut self, signal: Signal, value: u16) {
            self.table.spread(signal, value, &mut self.pins);
        }

        /// Press and release a key.
        fn press(&mut self, key: Signal) -> bool {
            self.set(key, 1);
            let start = self.write();
            self.set(key, 0);
            self.write();
            start
        }

        fn switches(&mut self, sr: u16) {
            self.set(Signal::SwitchRegister, sr);
            self.write();
        }

        fn deposit_program(&mut self, start: u16, words: &[u16]) {
            self.switches(start);
            self.press(Signal::LoadAddress);
            for w in words {
                self.switches(*w);
                self.press(Signal::Deposit);
            }
        }

        fn light(&self, signal: Signal) -> u16 {
            self.table.gather(signal, &self.machine.read_pins())
        }
    }

    #[test]
    fn test_deposit_and_examine() {
        let mut console = Console::new();
        console.deposit_program(0o200, &[0o7001, 0o7402]);
        let regs = console.machine.registers();
        assert_eq!(regs.pc, u12!(0o202));

        console.switches(0o200);
        console.press(Signal::LoadAddress);
        assert_eq!(console.light(Signal::MemoryBuffer), 0o7001);
        console.press(Signal::Examine);
        assert_eq!(console.light(Signal::MemoryAddress), 0o200);
        assert_eq!(console.light(Signal::MemoryBuffer), 0o7001);
        console.press(Signal::Examine);
        assert_eq!(console.light(Signal::MemoryBuffer), 0o7402);
        assert_eq!(console.machine.registers().pc, u12!(0o202));
        assert_eq!(console.machine.registers().state, MajorState::Idle);
    }

    #[test]
    fn test_load_address_sets_fields() {
        let mut console = Console::new();
        console.set(Signal::InstField, 1);
        console.set(Signal::DataField, 1);
        console.switches(0o400);
        console.press(Signal::LoadAddress);
        let regs = console.machine.registers();
        assert_eq!(regs.instruction_field, u3!(1));
        assert_eq!(regs.instruction_field_after_jump, u3!(1));
        assert_eq!(regs.data_field, u3!(1));
        assert_eq!(regs.pc, u12!(0o400));
        assert_eq!(console.light(Signal::ExtendedAddress), 1);

        // DEPOSIT goes to the data field.
        console.switches(0o1234);
        console.press(Signal::Deposit);
        console.set(Signal::InstField, 0);
        console.set(Signal::DataField, 0);
        console.switches(0o400);
        console.press(Signal::LoadAddress);
        assert_eq!(console.light(Signal::MemoryBuffer), 0);
        assert_eq!(console.light(Signal::ExtendedAddress), 0);
    }

    #[test]
    fn test_halt_stops_and_latches() {
        let mut console = Console::new();
        // IAC; HLT; IAC
        console.deposit_program(0o200, &[0o7001, 0o7402, 0o7001]);
        console.switches(0o200);
        console.press(Signal::LoadAddress);
        // CONTINUE without STEP asks for a worker.
        assert!(console.press(Signal::Continue));
        assert!(console.machine.is_running());
        assert_eq!(console.light(Signal::Run), 1);
        while console.machine.step() == StepOutcome::Continue {}
        assert!(!console.machine.is_running());
        assert_eq!(console.light(Signal::Run), 0);
        let pc = console.machine.registers().pc;
        assert_eq!(pc, u12!(0o202));
        assert_eq!(console.machine.registers().ac, u12!(1));

        // Stepping does nothing until CONTINUE.
        for _ in 0..5 {
            assert_eq!(console.machine.step(), StepOutcome::Halted);
        }
        assert_eq!(console.machine.registers().pc, pc);

        console.set(Signal::Step, 1);
        assert!(!console.press(Signal::Continue));
        assert!(!console.machine.is_halted());
        assert_eq!(console.machine.registers().pc, u12!(0o203));
        assert_eq!(console.light(Signal::Fetch), 1);
        assert_eq!(console.machine.registers().ac, u12!(2));
    }

    #[test]
    fn test_start_clears_ac_and_link() {
        let mut console = Console::new();
        console.deposit_program(0o200, &[0o7120]); // STL
        console.switches(0o200);
        console.press(Signal::LoadAddress);
        console.set(Signal::Step, 1);
        console.press(Signal::Start);
        assert!(console.machine.registers().link);
        console.switches(0o200);
        console.press(Signal::LoadAddress);
        console.machine.control.registers_mut().ac = u12!(0o55);
        console.press(Signal::Start);
        assert_eq!(console.machine.registers().ac, Unsigned12Bit::ZERO);
        assert!(console.machine.registers().link);
    }

    #[test]
    fn test_keys_ignored_while_running() {
        let mut console = Console::new();
        console.deposit_program(0o200, &[0o5200]); // JMP .
        console.switches(0o200);
        console.press(Signal::LoadAddress);
        assert!(console.press(Signal::Continue));
        console.switches(0o7777);
        console.press(Signal::Deposit);
        assert_eq!(console.machine.registers().pc, u12!(0o200));
        // The switch register is read even while running.
        assert_eq!(console.machine.registers().sr, u12!(0o7777));

        console.set(Signal::Stop, 1);
        let write = console.machine.accept_pins(&console.pins);
        assert!(write.stop_requested);
        assert!(!console.machine.is_running());
    }

    #[test]
    fn test_step_switch_stops() {
        let mut console = Console::new();
        console.deposit_program(0o200, &[0o5200]);
        console.switches(0o200);
        console.press(Signal::LoadAddress);
        assert!(console.press(Signal::Continue));
        console.set(Signal::Step, 1);
        let write = console.machine.accept_pins(&console.pins);
        assert!(write.stop_requested);
        assert!(!console.machine.is_running());
    }

    #[test]
    fn test_state_lights() {
        let mut console = Console::new();
        // TAD I 0250
        console.deposit_program(0o200, &[0o1650]);
        console.switches(0o200);
        console.press(Signal::LoadAddress);
        let state_lights = |c: &Console| {
            (
                c.light(Signal::Fetch),
                c.light(Signal::Defer),
                c.light(Signal::Execute),
            )
        };
        assert_eq!(state_lights(&console), (0, 0, 0));
        console.machine.step();
        assert_eq!(state_lights(&console), (1, 0, 0));
        assert_eq!(console.light(Signal::InstructionRegister), 1);
        console.machine.step();
        assert_eq!(state_lights(&console), (0, 1, 0));
        console.machine.step();
        assert_eq!(state_lights(&console), (0, 0, 1));
        assert_eq!(console.light(Signal::WordCount), 0);
    }

    #[test]
    fn test_teletype_interrupt() {
        let (kb_tx, kb_rx) = mpsc::channel();
        let clock = ManualClock::new();
        let tty = Teletype::new(10, Box::new(kb_rx), Box::new(Unconnected));
        let table = PinTable::standard();
        let mut machine = Pdp8l::new(
            &SimulatorConfig::default(),
            table,
            tty,
            Box::new(clock.clone()),
        );
        // ION; JMP .
        machine.mem.write(u3!(0), u12!(0o200), u12!(0o6001));
        machine.mem.write(u3!(0), u12!(0o201), u12!(0o5201));
        machine.control.registers_mut().pc = u12!(0o200);
        for _ in 0..10 {
            machine.step();
        }
        assert_eq!(machine.registers().pc, u12!(0o201));
        kb_tx.send(0o301).expect("keyboard channel open");
        clock.consume(&Duration::from_millis(100));
        machine.step();
        let regs = machine.registers();
        assert_eq!(regs.pc, u12!(1));
        assert!(regs.teletype.keyboard_flag);
        assert!(!regs.interrupts_enabled);
        assert_eq!(machine.mem.peek(u3!(0), u12!(0)), u12!(0o201));
    }
}
