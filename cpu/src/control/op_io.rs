use tracing::{event, Level};

use base::prelude::*;

use crate::control::ControlUnit;
use crate::io::{IotResponse, Teletype};

impl ControlUnit {
    /// Implements the IOT opcode.  The processor itself handles ION
    /// and IOF, the memory extension handles 62xx, and everything
    /// else goes to the teletype.
    pub(super) fn op_iot(&mut self, code: Unsigned12Bit, tty: &mut Teletype) {
        let response = match code.bits() {
            0o6001 => {
                self.fields.enable_interrupts_delayed();
                IotResponse::Done
            }
            0o6002 => {
                self.fields.disable_interrupts_immediately();
                IotResponse::Done
            }
            0o6200..=0o6277 => self.fields.set_field_bits(code, &mut self.regs.ac),
            _ => tty.iot(code, &mut self.regs.ac),
        };
        match response {
            IotResponse::Skip => self.skip(),
            IotResponse::Done => (),
            IotResponse::NotRecognised => {
                event!(
                    Level::DEBUG,
                    "IOT {:04o} at {:o}.{:04o} has no device; ignoring it",
                    code,
                    self.fields.instruction_field(),
                    self.fetched_from
                );
            }
        }
    }
}
