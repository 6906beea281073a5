//! This crate emulates the PDP-8/L: its processor, core memory,
//! memory extension, console teletype and front panel.
//!
//! Most users want [`SimulatorRuntime`], which runs the machine on a
//! worker thread and is driven through the front panel pins.
#![crate_name = "cpu"]

mod clock;
mod config;
mod control;
mod fatal;
mod io;
mod memory;
mod panel;
mod pdp8l;
mod runtime;

pub use clock::{Clock, ManualClock, WallClock};
pub use config::{
    ConfigError, SimulatorConfig, MAX_FIELD_COUNT, MAX_PIN, MAX_TTY_CHARS_PER_SECOND,
};
pub use control::{ControlUnit, FieldInterruptController, MajorState, Registers, StepOutcome};
pub use io::{
    ChannelFailure, IotResponse, KeyboardSource, PrinterSink, Teletype, TeletypeStatus,
    Unconnected, WritePrinter,
};
pub use memory::{MemoryReference, MemoryUnit};
pub use panel::{FrontPanel, KeyPresses, Lights, PinTable, PinVector, Signal, SwitchSettings};
pub use pdp8l::{Pdp8l, PinWrite, RegisterSnapshot};
pub use runtime::SimulatorRuntime;
