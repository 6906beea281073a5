//! Memory field selection and the interrupt system.
//!
//! These live together because the interrupt system saves and
//! clears the memory fields, and because the CIF instruction holds
//! off interrupts until the following jump (otherwise an interrupt
//! between CIF and JMP would return to the wrong field).
use serde::Serialize;
use tracing::{event, Level};

use base::prelude::*;

use crate::io::IotResponse;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldInterruptController {
    data_field: Unsigned3Bit,
    instruction_field: Unsigned3Bit,
    instruction_field_after_jump: Unsigned3Bit,
    saved_data_field: Unsigned3Bit,
    saved_instruction_field: Unsigned3Bit,
    inhibit_until_jump: bool,
    ion_enabled: bool,
    ion_delayed: bool,
    interrupt_requested: bool,
}

impl FieldInterruptController {
    pub fn new() -> FieldInterruptController {
        FieldInterruptController::default()
    }

    pub fn data_field(&self) -> Unsigned3Bit {
        self.data_field
    }

    pub fn instruction_field(&self) -> Unsigned3Bit {
        self.instruction_field
    }

    pub fn instruction_field_after_jump(&self) -> Unsigned3Bit {
        self.instruction_field_after_jump
    }

    pub fn saved_data_field(&self) -> Unsigned3Bit {
        self.saved_data_field
    }

    pub fn saved_instruction_field(&self) -> Unsigned3Bit {
        self.saved_instruction_field
    }

    pub fn inhibited_until_jump(&self) -> bool {
        self.inhibit_until_jump
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.ion_enabled
    }

    pub fn interrupt_requested(&self) -> bool {
        self.interrupt_requested
    }

    /// Latch an interrupt request from outside the processor.  The
    /// request stays up until it is acknowledged.
    pub fn request_interrupt(&mut self) {
        self.interrupt_requested = true;
    }

    /// Called just before an instruction fetch.  If interrupts are
    /// enabled, not held off by CIF, and either the latched request
    /// or `device_request` is up, acknowledge the interrupt: save and
    /// clear the fields and turn interrupts off.  The caller then
    /// performs the JMS to location 0 of field 0.
    pub fn acknowledge_if_pending(&mut self, device_request: bool) -> bool {
        let requested = self.interrupt_requested || device_request;
        if !(self.ion_enabled && requested && !self.inhibit_until_jump) {
            return false;
        }
        event!(
            Level::DEBUG,
            "acknowledging interrupt (IF={:o} DF={:o})",
            self.instruction_field,
            self.data_field
        );
        self.saved_data_field = self.data_field;
        self.saved_instruction_field = self.instruction_field;
        self.data_field = Unsigned3Bit::ZERO;
        self.instruction_field = Unsigned3Bit::ZERO;
        self.instruction_field_after_jump = Unsigned3Bit::ZERO;
        self.ion_delayed = false;
        self.ion_enabled = false;
        self.interrupt_requested = false;
        true
    }

    /// ION.  Interrupts become enabled at the start of the next fetch
    /// but one, so the instruction after ION always runs.
    pub fn enable_interrupts_delayed(&mut self) {
        self.ion_delayed = true;
    }

    /// IOF takes effect at once.
    pub fn disable_interrupts_immediately(&mut self) {
        self.ion_delayed = false;
        self.ion_enabled = false;
    }

    /// Called at the start of each fetch which does not take an
    /// interrupt.
    pub fn latch_interrupt_enable(&mut self) {
        self.ion_enabled = self.ion_delayed;
    }

    /// Fetch of a JMS or JMP allows interrupts again after CIF.
    pub fn clear_inhibit(&mut self) {
        self.inhibit_until_jump = false;
    }

    /// A jump (JMP, JMS or the interrupt) has been taken: the
    /// instruction field changes to the one selected by CIF.
    pub fn jump_taken(&mut self) {
        self.inhibit_until_jump = false;
        self.instruction_field = self.instruction_field_after_jump;
    }

    /// The LOAD ADDRESS key sets the fields from the front panel
    /// field switches.
    pub fn load_address(&mut self, data_field: Unsigned3Bit, instruction_field: Unsigned3Bit) {
        self.data_field = data_field;
        self.instruction_field = instruction_field;
        self.instruction_field_after_jump = instruction_field;
    }

    /// Perform one of the memory extension IOTs (62xx).
    ///
    /// | IOT  | Mnemonic | Effect |
    /// | ---- | -------- | ------ |
    /// | 62N1 | CDF N    | DF := N |
    /// | 62N2 | CIF N    | field after jump := N, hold off interrupts until the jump |
    /// | 62N3 | CDF CIF N | both of the above |
    /// | 6214 | RDF      | AC \|= DF << 3 |
    /// | 6224 | RIF      | AC \|= IF << 3 |
    /// | 6234 | RIB      | AC \|= saved IF << 3 \| saved DF |
    /// | 6244 | RMF      | DF := saved DF, field after jump := saved IF |
    pub fn set_field_bits(&mut self, code: Unsigned12Bit, ac: &mut Unsigned12Bit) -> IotResponse {
        let bits = code.bits();
        if bits & 0o7700 != 0o6200 {
            return IotResponse::NotRecognised;
        }
        match bits & 0o7 {
            1..=3 => {
                let field = code.middle_field_bits();
                if bits & 0o1 != 0 {
                    self.data_field = field;
                }
                if bits & 0o2 != 0 {
                    self.instruction_field_after_jump = field;
                    self.inhibit_until_jump = true;
                }
                IotResponse::Done
            }
            4 => {
                match bits {
                    0o6214 => *ac = *ac | self.data_field.shifted_into_bits_5_to_3(),
                    0o6224 => *ac = *ac | self.instruction_field.shifted_into_bits_5_to_3(),
                    0o6234 => {
                        *ac = *ac
                            | Unsigned12Bit::from(self.saved_data_field)
                            | self.saved_instruction_field.shifted_into_bits_5_to_3()
                    }
                    0o6244 => {
                        self.data_field = self.saved_data_field;
                        self.instruction_field_after_jump = self.saved_instruction_field;
                    }
                    _ => return IotResponse::NotRecognised,
                }
                IotResponse::Done
            }
            _ => IotResponse::NotRecognised,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FieldInterruptController;
    use crate::io::IotResponse;
    use base::prelude::*;

    #[test]
    fn test_ion_is_delayed() {
        let mut fic = FieldInterruptController::new();
        fic.enable_interrupts_delayed();
        assert!(!fic.interrupts_enabled());
        fic.latch_interrupt_enable();
        assert!(fic.interrupts_enabled());
        fic.disable_interrupts_immediately();
        assert!(!fic.interrupts_enabled());
        fic.latch_interrupt_enable();
        assert!(!fic.interrupts_enabled());
    }

    #[test]
    fn test_single_request_single_acknowledgement() {
        let mut fic = FieldInterruptController::new();
        fic.request_interrupt();
        // Not enabled yet.
        assert!(!fic.acknowledge_if_pending(false));
        fic.enable_interrupts_delayed();
        fic.latch_interrupt_enable();
        assert!(fic.acknowledge_if_pending(false));
        fic.enable_interrupts_delayed();
        fic.latch_interrupt_enable();
        assert!(!fic.acknowledge_if_pending(false));
    }

    #[test]
    fn test_acknowledge_saves_fields() {
        let mut fic = FieldInterruptController::new();
        let mut ac = Unsigned12Bit::ZERO;
        fic.load_address(u3!(2), u3!(1));
        fic.enable_interrupts_delayed();
        fic.latch_interrupt_enable();
        assert!(fic.acknowledge_if_pending(true));
        assert_eq!(fic.instruction_field(), u3!(0));
        assert_eq!(fic.data_field(), u3!(0));
        assert_eq!(fic.instruction_field_after_jump(), u3!(0));
        assert!(!fic.interrupts_enabled());
        assert_eq!(fic.set_field_bits(u12!(0o6234), &mut ac), IotResponse::Done);
        assert_eq!(ac, u12!(0o12));
        assert_eq!(fic.set_field_bits(u12!(0o6244), &mut ac), IotResponse::Done);
        assert_eq!(fic.data_field(), u3!(2));
        assert_eq!(fic.instruction_field_after_jump(), u3!(1));
        assert_eq!(fic.instruction_field(), u3!(0));
        fic.jump_taken();
        assert_eq!(fic.instruction_field(), u3!(1));
    }

    #[test]
    fn test_cif_inhibits_until_jump() {
        let mut fic = FieldInterruptController::new();
        let mut ac = Unsigned12Bit::ZERO;
        fic.enable_interrupts_delayed();
        fic.latch_interrupt_enable();
        assert_eq!(fic.set_field_bits(u12!(0o6212), &mut ac), IotResponse::Done);
        assert!(fic.inhibited_until_jump());
        assert_eq!(fic.instruction_field(), u3!(0));
        assert!(!fic.acknowledge_if_pending(true));
        fic.jump_taken();
        assert_eq!(fic.instruction_field(), u3!(1));
        assert!(fic.acknowledge_if_pending(true));
    }

    #[test]
    fn test_cdf_rdf_rif() {
        let mut fic = FieldInterruptController::new();
        let mut ac = u12!(0o7000);
        assert_eq!(fic.set_field_bits(u12!(0o6231), &mut ac), IotResponse::Done);
        assert_eq!(fic.data_field(), u3!(3));
        assert!(!fic.inhibited_until_jump());
        assert_eq!(fic.set_field_bits(u12!(0o6214), &mut ac), IotResponse::Done);
        assert_eq!(ac, u12!(0o7030));
        assert_eq!(fic.set_field_bits(u12!(0o6273), &mut ac), IotResponse::Done);
        assert_eq!(fic.data_field(), u3!(7));
        assert_eq!(fic.instruction_field_after_jump(), u3!(7));
        let mut ac = Unsigned12Bit::ZERO;
        assert_eq!(fic.set_field_bits(u12!(0o6224), &mut ac), IotResponse::Done);
        assert_eq!(ac, Unsigned12Bit::ZERO);
        assert_eq!(
            fic.set_field_bits(u12!(0o6204), &mut ac),
            IotResponse::NotRecognised
        );
        assert_eq!(
            fic.set_field_bits(u12!(0o6031), &mut ac),
            IotResponse::NotRecognised
        );
    }
}
