//! The `base` crate defines the PDP-8 related things which are useful
//! in both a simulator and other associated tools.  The idea is that
//! if you want to write an assembler or a disassembler, it would
//! depend on the base crate but would not need to depend on the
//! simulator library itself.

mod error;
mod types;
mod unsigned;

pub mod instruction;
pub mod prelude;
pub use crate::error::ConversionFailed;
pub use crate::unsigned::*;

#[macro_export]
macro_rules! u12 {
    ($n:expr) => {
        $crate::prelude::Unsigned12Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u7 {
    ($n:expr) => {
        $crate::prelude::Unsigned7Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u3 {
    ($n:expr) => {
        $crate::prelude::Unsigned3Bit::new::<{ $n }>()
    };
}

#[test]
fn test_u12() {
    use prelude::Unsigned12Bit;
    let m: Unsigned12Bit = u12!(0o7777);
    let n: Unsigned12Bit = Unsigned12Bit::try_from(4095_u16).expect("test data should be in range");
    assert_eq!(m, n);
    assert_eq!(m, Unsigned12Bit::MAX);
}

#[test]
fn test_u3() {
    use prelude::Unsigned3Bit;
    let p: Unsigned3Bit = u3!(5);
    let q: Unsigned3Bit = Unsigned3Bit::try_from(5_u8).expect("test data should be in range");
    assert_eq!(p, q);
}
