/// The PDP-8 addresses 4096 words directly.  Machines with the
/// memory extension control reach up to eight such 4K fields, and an
/// address within the whole of memory is a field number plus a
/// 12-bit address within that field.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use super::unsigned::{Unsigned12Bit, Unsigned3Bit};

/// Words per memory field.
pub const FIELD_SIZE: usize = 4096;

/// Words per page.  A memory reference instruction can directly
/// address page zero or the page it is itself in.
pub const PAGE_SIZE: u16 = 0o200;

/// Addresses 0010 to 0017 of each field are auto-index registers;
/// indirect references through them increment the pointer first.
pub const AUTO_INDEX_FIRST: u16 = 0o10;
pub const AUTO_INDEX_LAST: u16 = 0o17;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExtendedAddress {
    pub field: Unsigned3Bit,
    pub address: Unsigned12Bit,
}

impl ExtendedAddress {
    pub const fn new(field: Unsigned3Bit, address: Unsigned12Bit) -> ExtendedAddress {
        ExtendedAddress { field, address }
    }

    /// Index into a flat memory of `FIELD_SIZE * fields` words.
    pub fn flat_index(&self) -> usize {
        usize::from(self.field) * FIELD_SIZE + usize::from(self.address)
    }

    pub fn is_auto_index(&self) -> bool {
        (AUTO_INDEX_FIRST..=AUTO_INDEX_LAST).contains(&self.address.bits())
    }
}

impl Display for ExtendedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}.{:04o}", self.field, self.address)
    }
}

#[test]
fn test_extended_address_display() {
    let a = ExtendedAddress::new(Unsigned3Bit::ONE, Unsigned12Bit::from(0o17_u8));
    assert_eq!(a.to_string(), "1.0017");
    assert_eq!(ExtendedAddress::default().to_string(), "0.0000");
}

#[test]
fn test_flat_index() {
    let a = ExtendedAddress::new(Unsigned3Bit::ONE, Unsigned12Bit::from(0o17_u8));
    assert_eq!(a.flat_index(), 4096 + 0o17);
    assert!(a.is_auto_index());
    let b = ExtendedAddress::new(Unsigned3Bit::ZERO, Unsigned12Bit::from(0o20_u8));
    assert!(!b.is_auto_index());
}
