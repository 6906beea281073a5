//! The front panel, seen as a vector of pins.
//!
//! Whatever presents the panel to a user (real switches and lamps
//! wired to a bridge board, or a program driving a console) sees it
//! as a numbered collection of pins.  Switch and key pins are written
//! by the outside world; light pins are computed by the simulator.
//! Which pin carries which signal is described by a [`PinTable`], so
//! the simulator core does not depend on any particular wiring.
//!
//! Multi-bit signals (the registers) occupy several pins, listed most
//! significant bit first.

use std::collections::BTreeSet;

use serde::Serialize;

use base::prelude::*;

use crate::config::{ConfigError, MAX_PIN};

/// The signals of the PDP-8/L front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Signal {
    // Switches and keys.
    SwitchRegister,
    Step,
    InstField,
    DataField,
    MemProtect,
    Deposit,
    Examine,
    LoadAddress,
    Continue,
    Start,
    Stop,
    // Lights.
    Accumulator,
    MemoryAddress,
    MemoryBuffer,
    InstructionRegister,
    Fetch,
    Defer,
    Execute,
    WordCount,
    CurrentAddress,
    Break,
    InterruptOn,
    Run,
    ExtendedAddress,
    Link,
}

impl Signal {
    pub const ALL: [Signal; 25] = [
        Signal::SwitchRegister,
        Signal::Step,
        Signal::InstField,
        Signal::DataField,
        Signal::MemProtect,
        Signal::Deposit,
        Signal::Examine,
        Signal::LoadAddress,
        Signal::Continue,
        Signal::Start,
        Signal::Stop,
        Signal::Accumulator,
        Signal::MemoryAddress,
        Signal::MemoryBuffer,
        Signal::InstructionRegister,
        Signal::Fetch,
        Signal::Defer,
        Signal::Execute,
        Signal::WordCount,
        Signal::CurrentAddress,
        Signal::Break,
        Signal::InterruptOn,
        Signal::Run,
        Signal::ExtendedAddress,
        Signal::Link,
    ];

    /// Number of pins the signal occupies.
    pub fn width(&self) -> usize {
        match self {
            Signal::SwitchRegister
            | Signal::Accumulator
            | Signal::MemoryAddress
            | Signal::MemoryBuffer => 12,
            Signal::InstructionRegister => 3,
            _ => 1,
        }
    }

    /// True for signals which the outside world drives.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Signal::SwitchRegister
                | Signal::Step
                | Signal::InstField
                | Signal::DataField
                | Signal::MemProtect
                | Signal::Deposit
                | Signal::Examine
                | Signal::LoadAddress
                | Signal::Continue
                | Signal::Start
                | Signal::Stop
        )
    }
}

/// A snapshot of every pin of the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinVector {
    pins: Vec<bool>,
}

impl PinVector {
    pub fn new(len: usize) -> PinVector {
        PinVector {
            pins: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Pins beyond the end of the vector read as false.
    pub fn get(&self, pin: usize) -> bool {
        self.pins.get(pin).copied().unwrap_or(false)
    }

    /// Set a pin, growing the vector if necessary.  Pins above
    /// `MAX_PIN` do not exist and are ignored.
    pub fn set(&mut self, pin: usize, value: bool) {
        if pin > MAX_PIN {
            return;
        }
        if pin >= self.pins.len() {
            self.pins.resize(pin + 1, false);
        }
        self.pins[pin] = value;
    }
}

/// Maps each [`Signal`] to the pins which carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTable {
    groups: Vec<(Signal, Vec<usize>)>,
    pin_count: usize,
}

impl PinTable {
    /// Build a table from `(signal, pins)` groups, with the pins of
    /// each group listed most significant bit first.  Every signal
    /// must appear, with the right number of pins, and no pin may be
    /// used twice.
    pub fn new(groups: Vec<(Signal, Vec<usize>)>) -> Result<PinTable, ConfigError> {
        let mut used: BTreeSet<usize> = BTreeSet::new();
        for (signal, pins) in groups.iter() {
            if pins.len() != signal.width() {
                return Err(ConfigError::PinWidth {
                    signal: *signal,
                    expected: signal.width(),
                    got: pins.len(),
                });
            }
            for pin in pins.iter() {
                if *pin > MAX_PIN {
                    return Err(ConfigError::PinOutOfRange(*pin));
                }
                if !used.insert(*pin) {
                    return Err(ConfigError::DuplicatePin(*pin));
                }
            }
        }
        for signal in Signal::ALL {
            if !groups.iter().any(|(s, _)| *s == signal) {
                return Err(ConfigError::MissingSignal(signal));
            }
        }
        let pin_count = used.last().map(|last| last + 1).unwrap_or(0);
        Ok(PinTable { groups, pin_count })
    }

    /// The standard layout: the switches and keys occupy pins 0 to
    /// 21, followed by the lights.
    pub fn standard() -> PinTable {
        let mut next: usize = 0;
        let groups: Vec<(Signal, Vec<usize>)> = Signal::ALL
            .iter()
            .map(|signal| {
                let first = next;
                next += signal.width();
                (*signal, (first..next).collect())
            })
            .collect();
        let pin_count = next;
        PinTable { groups, pin_count }
    }

    /// One more than the highest pin number in use.
    pub fn pin_count(&self) -> usize {
        self.pin_count
    }

    pub fn pins(&self, signal: Signal) -> &[usize] {
        match self.groups.iter().find(|(s, _)| *s == signal) {
            Some((_, pins)) => pins.as_slice(),
            // PinTable::new() rejects tables with missing signals.
            None => unreachable!("pin table has no entry for {signal:?}"),
        }
    }

    /// Spread the low bits of `value` across the pins of `signal`.
    pub fn spread(&self, signal: Signal, value: u16, out: &mut PinVector) {
        let pins = self.pins(signal);
        let width = pins.len();
        for (i, pin) in pins.iter().enumerate() {
            let bitpos = width - 1 - i;
            out.set(*pin, (value >> bitpos) & 1 != 0);
        }
    }

    /// Collect the pins of `signal` into a value.
    pub fn gather(&self, signal: Signal, pins: &PinVector) -> u16 {
        self.pins(signal)
            .iter()
            .fold(0_u16, |acc, pin| (acc << 1) | u16::from(pins.get(*pin)))
    }

    fn is_input_pin(&self, pin: usize) -> bool {
        self.groups
            .iter()
            .any(|(signal, pins)| signal.is_input() && pins.contains(&pin))
    }
}

/// The settings of the toggle switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SwitchSettings {
    pub switch_register: Unsigned12Bit,
    pub step: bool,
    pub inst_field: bool,
    pub data_field: bool,
    pub mem_protect: bool,
}

/// Keys which were pressed (went from off to on) in a pin write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPresses {
    pub deposit: bool,
    pub examine: bool,
    pub load_address: bool,
    pub cont: bool,
    pub start: bool,
    pub stop: bool,
}

/// Values shown by the panel lights.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lights {
    pub accumulator: Unsigned12Bit,
    pub memory_address: Unsigned12Bit,
    pub memory_buffer: Unsigned12Bit,
    pub instruction_register: Unsigned3Bit,
    pub fetch: bool,
    pub defer: bool,
    pub execute: bool,
    pub interrupt_on: bool,
    pub run: bool,
    pub extended_address: bool,
    pub link: bool,
}

/// Remembers what was last written to the panel, which we need in
/// order to see keys being pressed.
#[derive(Debug, Clone)]
pub struct FrontPanel {
    table: PinTable,
    written: PinVector,
}

impl FrontPanel {
    pub fn new(table: PinTable) -> FrontPanel {
        let written = PinVector::new(table.pin_count());
        FrontPanel { table, written }
    }

    pub fn table(&self) -> &PinTable {
        &self.table
    }

    /// Accept a new set of input pin values.  Returns the switch
    /// settings and the keys which were pressed since the previous
    /// write.
    pub fn accept(&mut self, pins: &PinVector) -> (SwitchSettings, KeyPresses) {
        let table = &self.table;
        let switches = SwitchSettings {
            switch_register: Unsigned12Bit::truncating(table.gather(Signal::SwitchRegister, pins)),
            step: table.gather(Signal::Step, pins) != 0,
            inst_field: table.gather(Signal::InstField, pins) != 0,
            data_field: table.gather(Signal::DataField, pins) != 0,
            mem_protect: table.gather(Signal::MemProtect, pins) != 0,
        };
        let pressed = |signal: Signal| -> bool {
            table.gather(signal, &self.written) == 0 && table.gather(signal, pins) != 0
        };
        let keys = KeyPresses {
            deposit: pressed(Signal::Deposit),
            examine: pressed(Signal::Examine),
            load_address: pressed(Signal::LoadAddress),
            cont: pressed(Signal::Continue),
            start: pressed(Signal::Start),
            stop: pressed(Signal::Stop),
        };
        self.written = pins.clone();
        (switches, keys)
    }

    /// Produce the pin vector for a read: the most recently written
    /// input pins, with the lights overlaid.
    pub fn render(&self, lights: &Lights) -> PinVector {
        let table = &self.table;
        let mut out = PinVector::new(table.pin_count());
        for pin in 0..table.pin_count() {
            if table.is_input_pin(pin) {
                out.set(pin, self.written.get(pin));
            }
        }
        table.spread(Signal::Accumulator, lights.accumulator.bits(), &mut out);
        table.spread(Signal::MemoryAddress, lights.memory_address.bits(), &mut out);
        table.spread(Signal::MemoryBuffer, lights.memory_buffer.bits(), &mut out);
        table.spread(
            Signal::InstructionRegister,
            u16::from(lights.instruction_register),
            &mut out,
        );
        let flags = [
            (Signal::Fetch, lights.fetch),
            (Signal::Defer, lights.defer),
            (Signal::Execute, lights.execute),
            // The simulator performs no data break cycles.
            (Signal::WordCount, false),
            (Signal::CurrentAddress, false),
            (Signal::Break, false),
            (Signal::InterruptOn, lights.interrupt_on),
            (Signal::Run, lights.run),
            (Signal::ExtendedAddress, lights.extended_address),
            (Signal::Link, lights.link),
        ];
        for (signal, on) in flags {
            table.spread(signal, u16::from(on), &mut out);
        }
        out
    }
}
