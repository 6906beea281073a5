//! Simulator configuration.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::panel::Signal;

pub const MAX_FIELD_COUNT: u8 = 8;
pub const MAX_TTY_CHARS_PER_SECOND: u32 = 1_000_000;
/// The highest pin number a pin table may use.
pub const MAX_PIN: usize = 4095;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulatorConfig {
    /// Number of 4K memory fields fitted (1 to 8).
    pub field_count: u8,
    /// Teletype speed, in characters per second.
    pub tty_chars_per_second: u32,
    /// Log every instruction fetch and interrupt.
    pub trace_enabled: bool,
}

impl Default for SimulatorConfig {
    fn default() -> SimulatorConfig {
        SimulatorConfig {
            field_count: 2,
            tty_chars_per_second: 10,
            trace_enabled: false,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_FIELD_COUNT).contains(&self.field_count) {
            return Err(ConfigError::FieldCount(self.field_count));
        }
        if !(1..=MAX_TTY_CHARS_PER_SECOND).contains(&self.tty_chars_per_second) {
            return Err(ConfigError::CharRate(self.tty_chars_per_second));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    FieldCount(u8),
    CharRate(u32),
    /// A pin table assigns the wrong number of pins to a signal.
    PinWidth {
        signal: Signal,
        expected: usize,
        got: usize,
    },
    /// A pin table uses the same pin twice.
    DuplicatePin(usize),
    /// A pin table omits a signal.
    MissingSignal(Signal),
    /// A pin table uses a pin number above `MAX_PIN`.
    PinOutOfRange(usize),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ConfigError::FieldCount(n) => write!(
                f,
                "number of memory fields {n} must be in range 1..{MAX_FIELD_COUNT}"
            ),
            ConfigError::CharRate(n) => write!(
                f,
                "teletype speed {n} characters per second must be in range 1..{MAX_TTY_CHARS_PER_SECOND}"
            ),
            ConfigError::PinWidth {
                signal,
                expected,
                got,
            } => write!(
                f,
                "signal {signal:?} needs {expected} pins but the pin table gives it {got}"
            ),
            ConfigError::DuplicatePin(pin) => {
                write!(f, "pin {pin} is assigned to more than one signal")
            }
            ConfigError::MissingSignal(signal) => {
                write!(f, "pin table has no pins for signal {signal:?}")
            }
            ConfigError::PinOutOfRange(pin) => {
                write!(f, "pin {pin} is above the highest allowed pin {MAX_PIN}")
            }
        }
    }
}

impl Error for ConfigError {}

#[test]
fn test_default_config_is_valid() {
    assert_eq!(SimulatorConfig::default().validate(), Ok(()));
}

#[test]
fn test_field_count_range() {
    for (n, ok) in [(0_u8, false), (1, true), (8, true), (9, false)] {
        let config = SimulatorConfig {
            field_count: n,
            ..SimulatorConfig::default()
        };
        assert_eq!(config.validate().is_ok(), ok, "field count {n}");
    }
}

#[test]
fn test_char_rate_range() {
    let too_fast = SimulatorConfig {
        tty_chars_per_second: 1_000_001,
        ..SimulatorConfig::default()
    };
    assert_eq!(too_fast.validate(), Err(ConfigError::CharRate(1_000_001)));
    let stopped = SimulatorConfig {
        tty_chars_per_second: 0,
        ..SimulatorConfig::default()
    };
    assert_eq!(stopped.validate(), Err(ConfigError::CharRate(0)));
    assert_eq!(
        ConfigError::FieldCount(9).to_string(),
        "number of memory fields 9 must be in range 1..8"
    );
}
