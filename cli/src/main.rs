use std::error::Error;
use std::ffi::OsString;
use std::fmt::{self, Display, Formatter};
use std::fs;

use clap::builder::BoolishValueParser;
use clap::ArgAction::{Set, SetTrue};
use clap::Parser;
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use base::prelude::*;
use cpu::{
    PinTable, PinVector, RegisterSnapshot, Signal, SimulatorConfig, SimulatorRuntime, WallClock,
};

mod image;
mod terminal;

use image::{parse_address, parse_image, Block};

/// Simulate the PDP-8/L minicomputer
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// File containing the core image to load, in octal
    /// ("[F.]AAAA: WWWW WWWW ...").
    #[clap(action = Set)]
    image: OsString,

    /// Number of 4K memory fields fitted (1 to 8).
    #[clap(action = Set, long, env = "PDP8L_MEMFIELDS", default_value_t = 2)]
    fields: u8,

    /// Teletype speed in characters per second.
    #[clap(action = Set, long, env = "PDP8L_TTYCPS", default_value_t = 10)]
    tty_cps: u32,

    /// Log every instruction as it is fetched.  The environment
    /// variable accepts "1", "yes", "on" and so forth.
    #[clap(action = SetTrue, long, env = "PDP8L_SIMTRACE", value_parser = BoolishValueParser::new())]
    trace: bool,

    /// Start address, in octal ("AAAA" or "F.AAAA").
    #[clap(action = Set, long, default_value = "0200")]
    start: String,

    /// When the program halts, print the registers as JSON on the
    /// standard error stream (standard output belongs to the
    /// teletype printer).
    #[clap(action = SetTrue, long)]
    dump_registers: bool,
}

#[derive(Debug)]
enum Fail {
    InitialisationFailure(String),
    BadImage(String),
    RegisterDump(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::InitialisationFailure(msg) | Fail::BadImage(msg) | Fail::RegisterDump(msg) => {
                f.write_str(msg.as_str())
            }
        }
    }
}

impl Error for Fail {}

/// Operates the front panel of a runtime, the way a person at the
/// console would.
struct Operator {
    runtime: SimulatorRuntime,
    table: PinTable,
    pins: PinVector,
}

impl Operator {
    fn set(&mut self, signal: Signal, value: u16) {
        self.table.spread(signal, value, &mut self.pins);
        self.runtime.write_pins(&self.pins);
    }

    fn press(&mut self, key: Signal) {
        self.set(key, 1);
        self.set(key, 0);
    }

    /// Select an address with the field switches, the switch register
    /// and LOAD ADDRESS.
    fn load_address(&mut self, address: ExtendedAddress) {
        let field = u16::from(address.field);
        self.set(Signal::InstField, field);
        self.set(Signal::DataField, field);
        self.set(Signal::SwitchRegister, address.address.bits());
        self.press(Signal::LoadAddress);
    }

    fn deposit(&mut self, block: &Block) {
        self.load_address(block.start);
        for word in block.words.iter() {
            self.set(Signal::SwitchRegister, word.bits());
            self.press(Signal::Deposit);
        }
    }
}

/// The field switches on the panel select field 0 or 1 only.
fn check_reachable(address: ExtendedAddress, field_count: u8) -> Result<(), Fail> {
    let field = u8::from(address.field);
    if field > 1 {
        Err(Fail::BadImage(format!(
            "{address}: the front panel can only load fields 0 and 1"
        )))
    } else if field >= field_count {
        Err(Fail::BadImage(format!(
            "{address}: only {field_count} memory field(s) are fitted"
        )))
    } else {
        Ok(())
    }
}

fn run_simulator() -> Result<(), Fail> {
    let cli = Cli::parse();

    // See
    // https://docs.rs/tracing-subscriber/0.2.19/tracing_subscriber/fmt/index.html#filtering-events-with-environment-variables
    // for instructions on how to select which trace messages get
    // printed.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => {
            return Err(Fail::InitialisationFailure(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let config = SimulatorConfig {
        field_count: cli.fields,
        tty_chars_per_second: cli.tty_cps,
        trace_enabled: cli.trace,
    };
    let start = parse_address(&cli.start)
        .ok_or_else(|| Fail::InitialisationFailure(format!("invalid start address '{}'", cli.start)))?;
    check_reachable(start, config.field_count)?;

    let text = fs::read_to_string(&cli.image).map_err(|e| {
        Fail::BadImage(format!("failed to read {}: {e}", cli.image.to_string_lossy()))
    })?;
    let blocks = parse_image(&text).map_err(|e| {
        Fail::BadImage(format!("{}: {e}", cli.image.to_string_lossy()))
    })?;
    for block in blocks.iter() {
        check_reachable(block.start, config.field_count)?;
    }

    let keyboard = terminal::keyboard().map_err(|e| {
        Fail::InitialisationFailure(format!("failed to start the keyboard thread: {e}"))
    })?;
    let table = PinTable::standard();
    let runtime = SimulatorRuntime::new(
        &config,
        table.clone(),
        Box::new(keyboard),
        Box::new(terminal::printer()),
        Box::new(WallClock::new()),
    )
    .map_err(|e| Fail::InitialisationFailure(format!("invalid configuration: {e}")))?;
    event!(
        Level::INFO,
        "teletype connected to the terminal at {} characters per second",
        config.tty_chars_per_second
    );

    let pins = PinVector::new(table.pin_count());
    let mut operator = Operator {
        runtime,
        table,
        pins,
    };

    let span = span!(Level::INFO, "run", image=?cli.image, start=%start);
    let _enter = span.enter();
    for block in blocks.iter() {
        operator.deposit(block);
    }
    event!(
        Level::DEBUG,
        "loaded {} words",
        blocks.iter().map(|b| b.words.len()).sum::<usize>()
    );
    operator.load_address(start);
    operator.press(Signal::Start);
    operator.runtime.wait_for_halt();

    let registers = operator.runtime.registers();
    event!(
        Level::INFO,
        "halted at {:o}.{:04o} with L.AC={:o}.{:04o}",
        registers.instruction_field,
        registers.pc,
        u8::from(registers.link),
        registers.ac
    );
    if cli.dump_registers {
        eprintln!("{}", registers_as_json(&registers)?);
    }
    Ok(())
}

fn registers_as_json(registers: &RegisterSnapshot) -> Result<String, Fail> {
    serde_json::to_string_pretty(registers)
        .map_err(|e| Fail::RegisterDump(format!("failed to format the registers: {e}")))
}

fn main() {
    match run_simulator() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}

#[test]
fn test_check_reachable() {
    assert!(check_reachable(ExtendedAddress::new(u3!(1), u12!(0o200)), 2).is_ok());
    assert!(check_reachable(ExtendedAddress::new(u3!(1), u12!(0o200)), 1).is_err());
    assert!(check_reachable(ExtendedAddress::new(u3!(2), u12!(0o200)), 8).is_err());
}

#[test]
fn test_trace_environment_variable() {
    // This is the only test which touches PDP8L_SIMTRACE.
    for (value, expected) in [("1", true), ("yes", true), ("on", true), ("0", false), ("off", false)] {
        std::env::set_var("PDP8L_SIMTRACE", value);
        let cli = Cli::try_parse_from(["pdp8l", "image.txt"])
            .unwrap_or_else(|e| panic!("PDP8L_SIMTRACE={value} should be accepted: {e}"));
        assert_eq!(cli.trace, expected, "PDP8L_SIMTRACE={value}");
    }
    std::env::remove_var("PDP8L_SIMTRACE");
    let cli = Cli::try_parse_from(["pdp8l", "image.txt", "--trace"]).expect("--trace is a flag");
    assert!(cli.trace);
}

#[test]
fn test_register_dump_uses_plain_numbers() {
    let json = serde_json::to_string(&u12!(0o130)).expect("a word should serialise");
    assert_eq!(json, "88");
    let json = serde_json::to_string(&ExtendedAddress::new(u3!(1), u12!(0o200)))
        .expect("an address should serialise");
    assert_eq!(json, r#"{"field":1,"address":128}"#);
}
