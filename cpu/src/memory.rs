//! Core memory.
//!
//! The PDP-8/L has 4K words of core in its basic configuration.  The
//! memory extension adds further 4K fields, up to a total of eight.
//! A reference to a field which is not fitted reads as zero and a
//! write to it is lost, which is what the hardware does when the
//! field select lines address a missing memory stack.
use serde::Serialize;
use tracing::{event, Level};

use base::prelude::*;

/// The most recent memory cycle.  The front panel MA and MB lights
/// (and the EMA light) show this.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryReference {
    pub address: ExtendedAddress,
    pub word: Unsigned12Bit,
}

#[derive(Debug)]
pub struct MemoryUnit {
    field_count: u8,
    words: Vec<Unsigned12Bit>,
    last_reference: MemoryReference,
}

impl MemoryUnit {
    /// Create a memory of `field_count` fields, all zero.  The field
    /// count has already been validated by the configuration, but we
    /// never allocate more than the eight fields which a 3-bit field
    /// number can select.
    pub fn new(field_count: u8) -> MemoryUnit {
        let field_count = field_count.min(8);
        event!(
            Level::INFO,
            "memory size {}K words",
            u32::from(field_count) * 4
        );
        MemoryUnit {
            field_count,
            words: vec![Unsigned12Bit::ZERO; usize::from(field_count) * FIELD_SIZE],
            last_reference: MemoryReference::default(),
        }
    }

    pub fn field_count(&self) -> u8 {
        self.field_count
    }

    fn is_fitted(&self, field: Unsigned3Bit) -> bool {
        u8::from(field) < self.field_count
    }

    /// Read a word.  A field which is not fitted reads as zero.
    pub fn read(&mut self, field: Unsigned3Bit, address: Unsigned12Bit) -> Unsigned12Bit {
        let address = ExtendedAddress::new(field, address);
        let word = if self.is_fitted(field) {
            self.words[address.flat_index()]
        } else {
            event!(Level::TRACE, "read from missing field at {}", address);
            Unsigned12Bit::ZERO
        };
        self.last_reference = MemoryReference { address, word };
        word
    }

    /// Write a word.  Writes to a field which is not fitted are
    /// discarded.
    pub fn write(&mut self, field: Unsigned3Bit, address: Unsigned12Bit, word: Unsigned12Bit) {
        let address = ExtendedAddress::new(field, address);
        if self.is_fitted(field) {
            self.words[address.flat_index()] = word;
        } else {
            event!(Level::TRACE, "write to missing field at {} discarded", address);
        }
        self.last_reference = MemoryReference { address, word };
    }

    /// Look at a word without performing a memory cycle (so the
    /// last-reference record is unchanged).
    pub fn peek(&self, field: Unsigned3Bit, address: Unsigned12Bit) -> Unsigned12Bit {
        if self.is_fitted(field) {
            self.words[ExtendedAddress::new(field, address).flat_index()]
        } else {
            Unsigned12Bit::ZERO
        }
    }

    pub fn last_reference(&self) -> MemoryReference {
        self.last_reference
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryUnit;
    use base::prelude::*;
    use test_strategy::{proptest, Arbitrary};

    #[derive(Arbitrary, Debug)]
    struct MemoryAccess {
        #[strategy(1..=8_u8)]
        field_count: u8,
        #[strategy(0..8_u8)]
        field: u8,
        #[strategy(0..=0o7777_u16)]
        address: u16,
        #[strategy(0..=0o7777_u16)]
        word: u16,
    }

    #[proptest]
    fn write_then_read(input: MemoryAccess) {
        let mut mem = MemoryUnit::new(input.field_count);
        let field = Unsigned3Bit::try_from(input.field).unwrap();
        let address = Unsigned12Bit::try_from(input.address).unwrap();
        let word = Unsigned12Bit::try_from(input.word).unwrap();
        mem.write(field, address, word);
        let got = mem.read(field, address);
        if input.field < input.field_count {
            assert_eq!(got, word);
        } else {
            assert_eq!(got, Unsigned12Bit::ZERO);
            // Nothing in the fitted fields changed either.
            for f in 0..input.field_count {
                let f = Unsigned3Bit::try_from(f).unwrap();
                assert_eq!(mem.peek(f, address), Unsigned12Bit::ZERO);
            }
        }
    }

    #[test]
    fn test_last_reference() {
        let mut mem = MemoryUnit::new(2);
        mem.write(u3!(1), u12!(0o200), u12!(0o7402));
        let last = mem.last_reference();
        assert_eq!(last.address, ExtendedAddress::new(u3!(1), u12!(0o200)));
        assert_eq!(last.word, u12!(0o7402));

        // A read from a missing field is still a memory cycle.
        assert_eq!(mem.read(u3!(5), u12!(0o17)), Unsigned12Bit::ZERO);
        assert_eq!(mem.last_reference().address.to_string(), "5.0017");
        assert_eq!(mem.last_reference().word, Unsigned12Bit::ZERO);
    }

    #[test]
    fn test_peek_has_no_side_effect() {
        let mut mem = MemoryUnit::new(1);
        mem.write(u3!(0), u12!(0o10), u12!(0o1234));
        mem.write(u3!(0), u12!(0o20), u12!(0o4321));
        assert_eq!(mem.peek(u3!(0), u12!(0o10)), u12!(0o1234));
        assert_eq!(mem.last_reference().address.address, u12!(0o20));
    }
}
