//! The console teletype.
//!
//! The keyboard and printer each have a one-character buffer and a
//! flag.  The keyboard flag rises when a character arrives; the
//! printer flag rises when the printer has finished with the last
//! character it was given.  Characters move at a configured rate
//! (10 characters per second for a real ASR-33), which we emulate by
//! refusing to move another character until the previous one's time
//! has elapsed.
//!
//! | IOT  | Mnemonic | Effect |
//! | ---- | -------- | ------ |
//! | 6031 | KSF | skip if keyboard flag |
//! | 6032 | KCC | clear AC and keyboard flag |
//! | 6034 | KRS | OR keyboard buffer into AC |
//! | 6035 | KIE | teletype interrupt enable := AC bit 11 |
//! | 6036 | KRB | AC := keyboard buffer, clear keyboard flag |
//! | 6041 | TSF | skip if printer flag |
//! | 6042 | TCF | clear printer flag |
//! | 6044 | TPC | load printer buffer from AC and print |
//! | 6045 | TSK | skip if teletype interrupt request |
//! | 6046 | TLS | clear printer flag, load printer buffer and print |
use std::time::Duration;

use serde::Serialize;
use tracing::{event, Level};

use base::prelude::*;

use super::{IotResponse, KeyboardSource, PrinterSink};
use crate::fatal;

/// The externally visible state of the teletype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeletypeStatus {
    pub keyboard_flag: bool,
    pub keyboard_char: u8,
    pub printer_flag: bool,
    pub printer_full: bool,
    pub printer_char: u8,
    pub interrupt_enable: bool,
    pub interrupt_request: bool,
}

#[derive(Debug)]
pub struct Teletype {
    keyboard_flag: bool,
    keyboard_char: u8,
    printer_flag: bool,
    printer_full: bool,
    printer_char: u8,
    interrupt_enable: bool,
    interrupt_request: bool,
    char_interval: Duration,
    keyboard_due: Duration,
    printer_due: Duration,
    keyboard: Box<dyn KeyboardSource>,
    printer: Box<dyn PrinterSink>,
}

impl Teletype {
    /// `chars_per_second` has already been validated (it is at least 1).
    pub fn new(
        chars_per_second: u32,
        keyboard: Box<dyn KeyboardSource>,
        printer: Box<dyn PrinterSink>,
    ) -> Teletype {
        let char_interval = Duration::from_micros(1_000_000 / u64::from(chars_per_second.max(1)));
        Teletype {
            keyboard_flag: false,
            keyboard_char: 0,
            printer_flag: false,
            printer_full: false,
            printer_char: 0,
            // The interrupt enable powers up set.
            interrupt_enable: true,
            interrupt_request: false,
            char_interval,
            keyboard_due: Duration::ZERO,
            printer_due: Duration::ZERO,
            keyboard,
            printer,
        }
    }

    /// Move characters between the teletype buffers and the channels,
    /// if their time has come, and recompute the interrupt request.
    pub fn poll(&mut self, now: Duration) {
        if self.printer_full && now >= self.printer_due {
            match self.printer.try_write(self.printer_char) {
                Ok(true) => {
                    event!(
                        Level::TRACE,
                        "printed character {:03o}",
                        self.printer_char
                    );
                    self.printer_flag = true;
                    self.printer_full = false;
                    self.printer_due = now + self.char_interval;
                }
                Ok(false) => (), // try again at the next poll
                Err(e) => fatal::abort_with("teletype printer channel failed", &e),
            }
        }

        if now >= self.keyboard_due {
            match self.keyboard.try_read() {
                Ok(Some(ch)) => {
                    event!(Level::TRACE, "keyboard character {:03o}", ch);
                    self.keyboard_char = ch;
                    self.keyboard_flag = true;
                    self.keyboard_due = now + self.char_interval;
                }
                Ok(None) => (),
                Err(e) => fatal::abort_with("teletype keyboard channel failed", &e),
            }
        }

        self.interrupt_request = self.interrupt_enable && (self.keyboard_flag || self.printer_flag);
    }

    /// The teletype's interrupt request line, as computed by the most
    /// recent poll.
    pub fn interrupt_request(&self) -> bool {
        self.interrupt_request
    }

    /// Perform a teletype IOT.
    pub fn iot(&mut self, code: Unsigned12Bit, ac: &mut Unsigned12Bit) -> IotResponse {
        fn skip_if(cond: bool) -> IotResponse {
            if cond {
                IotResponse::Skip
            } else {
                IotResponse::Done
            }
        }

        match code.bits() {
            0o6031 => skip_if(self.keyboard_flag),
            0o6032 => {
                *ac = Unsigned12Bit::ZERO;
                self.keyboard_flag = false;
                IotResponse::Done
            }
            0o6034 => {
                *ac = *ac | Unsigned12Bit::from(self.keyboard_char);
                IotResponse::Done
            }
            0o6035 => {
                self.interrupt_enable = ac.bit(0);
                IotResponse::Done
            }
            0o6036 => {
                *ac = Unsigned12Bit::from(self.keyboard_char);
                self.keyboard_flag = false;
                IotResponse::Done
            }
            0o6041 => skip_if(self.printer_flag),
            0o6042 => {
                self.printer_flag = false;
                IotResponse::Done
            }
            0o6044 => {
                self.load_printer(*ac);
                IotResponse::Done
            }
            0o6045 => skip_if(self.interrupt_request),
            0o6046 => {
                self.printer_flag = false;
                self.load_printer(*ac);
                IotResponse::Done
            }
            _ => IotResponse::NotRecognised,
        }
    }

    fn load_printer(&mut self, ac: Unsigned12Bit) {
        // The printer takes the low 8 bits of AC.
        self.printer_char = (ac & 0o377_u16).bits() as u8;
        self.printer_full = true;
    }

    pub fn status(&self) -> TeletypeStatus {
        TeletypeStatus {
            keyboard_flag: self.keyboard_flag,
            keyboard_char: self.keyboard_char,
            printer_flag: self.printer_flag,
            printer_full: self.printer_full,
            printer_char: self.printer_char,
            interrupt_enable: self.interrupt_enable,
            interrupt_request: self.interrupt_request,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use base::prelude::*;

    use super::Teletype;
    use crate::io::{IotResponse, Unconnected};

    fn connected(cps: u32) -> (Teletype, mpsc::Sender<u8>, mpsc::Receiver<u8>) {
        let (kb_tx, kb_rx) = mpsc::channel();
        let (pr_tx, pr_rx) = mpsc::channel();
        (
            Teletype::new(cps, Box::new(kb_rx), Box::new(pr_tx)),
            kb_tx,
            pr_rx,
        )
    }

    #[test]
    fn test_keyboard_character_arrives() {
        let (mut tty, kb, _pr) = connected(10);
        kb.send(0o101).expect("keyboard channel open");
        let mut now = Duration::ZERO;
        while now <= Duration::from_millis(100) {
            tty.poll(now);
            now += Duration::from_millis(10);
        }
        let status = tty.status();
        assert!(status.keyboard_flag);
        assert_eq!(status.keyboard_char, 0o101);

        // KRS ORs the character into AC.
        let mut ac = Unsigned12Bit::ZERO;
        assert_eq!(tty.iot(u12!(0o6034), &mut ac), IotResponse::Done);
        assert_eq!(ac, u12!(0o101));
        // KRS leaves the flag alone, KRB clears it.
        assert_eq!(tty.iot(u12!(0o6031), &mut ac), IotResponse::Skip);
        assert_eq!(tty.iot(u12!(0o6036), &mut ac), IotResponse::Done);
        assert_eq!(tty.iot(u12!(0o6031), &mut ac), IotResponse::Done);
    }

    #[test]
    fn test_keyboard_is_paced() {
        let (mut tty, kb, _pr) = connected(10);
        kb.send(b'a').expect("keyboard channel open");
        kb.send(b'b').expect("keyboard channel open");
        tty.poll(Duration::ZERO);
        assert_eq!(tty.status().keyboard_char, b'a');
        // The next character is not read until 100ms later.
        tty.poll(Duration::from_millis(99));
        assert_eq!(tty.status().keyboard_char, b'a');
        tty.poll(Duration::from_millis(100));
        assert_eq!(tty.status().keyboard_char, b'b');
    }

    #[test]
    fn test_printer() {
        let (mut tty, _kb, pr) = connected(10);
        let mut ac = u12!(0o7310); // only the low 8 bits are printed
        assert_eq!(tty.iot(u12!(0o6046), &mut ac), IotResponse::Done);
        assert!(tty.status().printer_full);
        assert_eq!(tty.iot(u12!(0o6041), &mut ac), IotResponse::Done);
        tty.poll(Duration::ZERO);
        assert_eq!(pr.try_recv(), Ok(0o310));
        assert!(tty.status().printer_flag);
        assert_eq!(tty.iot(u12!(0o6041), &mut ac), IotResponse::Skip);

        // The second character waits for the first to finish.
        assert_eq!(tty.iot(u12!(0o6046), &mut ac), IotResponse::Done);
        assert!(!tty.status().printer_flag);
        tty.poll(Duration::from_millis(50));
        assert!(pr.try_recv().is_err());
        tty.poll(Duration::from_millis(100));
        assert_eq!(pr.try_recv(), Ok(0o310));
    }

    #[test]
    fn test_interrupt_request() {
        let (mut tty, kb, _pr) = connected(1000);
        let mut ac = Unsigned12Bit::ZERO;
        tty.poll(Duration::ZERO);
        assert!(!tty.interrupt_request());
        kb.send(b'x').expect("keyboard channel open");
        tty.poll(Duration::from_millis(1));
        assert!(tty.interrupt_request());
        assert_eq!(tty.iot(u12!(0o6045), &mut ac), IotResponse::Skip);

        // Disable teletype interrupts with KIE (AC bit 11 clear).
        assert_eq!(tty.iot(u12!(0o6035), &mut ac), IotResponse::Done);
        tty.poll(Duration::from_millis(2));
        assert!(!tty.interrupt_request());
        assert_eq!(tty.iot(u12!(0o6045), &mut ac), IotResponse::Done);
    }

    #[test]
    fn test_kcc_and_tcf() {
        let mut tty = Teletype::new(10, Box::new(Unconnected), Box::new(Unconnected));
        let mut ac = u12!(0o1234);
        assert_eq!(tty.iot(u12!(0o6032), &mut ac), IotResponse::Done);
        assert_eq!(ac, Unsigned12Bit::ZERO);
        assert_eq!(tty.iot(u12!(0o6042), &mut ac), IotResponse::Done);
        assert_eq!(tty.iot(u12!(0o6033), &mut ac), IotResponse::NotRecognised);
    }

    #[test]
    fn test_unconnected_printer_holds_character() {
        let mut tty = Teletype::new(10, Box::new(Unconnected), Box::new(Unconnected));
        let mut ac = u12!(0o215);
        tty.iot(u12!(0o6046), &mut ac);
        tty.poll(Duration::from_secs(1));
        assert!(tty.status().printer_full);
        assert!(!tty.status().printer_flag);
    }
}
