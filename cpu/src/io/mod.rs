//! Peripherals attached to the I/O bus.
//!
//! The simulated PDP-8/L has one peripheral, the console teletype
//! (device codes 03 for the keyboard and 04 for the printer).  The
//! teletype talks to the outside world through a pair of byte
//! channels, one in each direction, described by the
//! [`KeyboardSource`] and [`PrinterSink`] traits.
//!
//! Neither channel ever blocks the simulator.  A keyboard with no
//! character waiting, or a printer which cannot accept a character
//! yet, is normal.  A channel which has failed is not; the teletype
//! treats that as fatal.

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

mod tty;

pub use tty::{Teletype, TeletypeStatus};

/// The response of a device to an IOT instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IotResponse {
    /// The device carried out the instruction and the next
    /// instruction should be skipped.
    Skip,
    /// The device carried out the instruction.
    Done,
    /// The instruction is not one this device implements.
    NotRecognised,
}

/// Failure of a teletype channel.
#[derive(Debug)]
pub enum ChannelFailure {
    /// The other end of the channel has gone away.
    Closed,
    Io(io::Error),
}

impl Display for ChannelFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ChannelFailure::Closed => f.write_str("channel closed"),
            ChannelFailure::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for ChannelFailure {}

impl From<io::Error> for ChannelFailure {
    fn from(e: io::Error) -> ChannelFailure {
        ChannelFailure::Io(e)
    }
}

/// Where keyboard characters come from.
pub trait KeyboardSource: Debug + Send {
    /// Return the next character if one is ready.  `Ok(None)` means
    /// there is nothing to read at the moment (including the case
    /// where the source has reached end-of-file).
    fn try_read(&mut self) -> Result<Option<u8>, ChannelFailure>;
}

/// Where printed characters go.
pub trait PrinterSink: Debug + Send {
    /// Offer a character to the printer.  `Ok(true)` means it was
    /// accepted, `Ok(false)` means the sink cannot take it yet and it
    /// should be offered again later.
    fn try_write(&mut self, ch: u8) -> Result<bool, ChannelFailure>;
}

impl KeyboardSource for Receiver<u8> {
    fn try_read(&mut self) -> Result<Option<u8>, ChannelFailure> {
        match self.try_recv() {
            Ok(ch) => Ok(Some(ch)),
            // When the sending side has hung up, the keyboard is
            // simply silent from now on.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Ok(None),
        }
    }
}

impl PrinterSink for Sender<u8> {
    fn try_write(&mut self, ch: u8) -> Result<bool, ChannelFailure> {
        match self.send(ch) {
            Ok(()) => Ok(true),
            Err(_) => Err(ChannelFailure::Closed),
        }
    }
}

/// A printer sink which writes to any [`Write`] implementation
/// (for example standard output).
#[derive(Debug)]
pub struct WritePrinter<W: Write + Debug + Send> {
    inner: W,
}

impl<W: Write + Debug + Send> WritePrinter<W> {
    pub fn new(inner: W) -> WritePrinter<W> {
        WritePrinter { inner }
    }
}

impl<W: Write + Debug + Send> PrinterSink for WritePrinter<W> {
    fn try_write(&mut self, ch: u8) -> Result<bool, ChannelFailure> {
        match self.inner.write(&[ch]) {
            Ok(0) => Err(ChannelFailure::Closed),
            Ok(_) => {
                self.inner.flush()?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
            Err(e) => Err(ChannelFailure::Io(e)),
        }
    }
}

/// Stands in for a teletype channel with nothing connected to it.
/// The keyboard never has a character and the printer never accepts
/// one (so a program which prints will wait for the printer flag).
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconnected;

impl KeyboardSource for Unconnected {
    fn try_read(&mut self) -> Result<Option<u8>, ChannelFailure> {
        Ok(None)
    }
}

impl PrinterSink for Unconnected {
    fn try_write(&mut self, _ch: u8) -> Result<bool, ChannelFailure> {
        Ok(false)
    }
}
