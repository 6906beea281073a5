//! Fixed-width unsigned quantities.
//!
//! The PDP-8 uses 12-bit words, and this is also the width of an
//! address within a memory field.  Some other quantities are
//! narrower: a memory field number has 3 bits and the page offset of
//! a memory reference instruction has 7 bits.  Each width has its own
//! type so that values are always held masked to their width.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter, Octal};
use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::error::ConversionFailed;

#[cfg(test)]
mod tests;

/// This macro implements conversions from native types to Unsigned*Bit
/// which are always possible (e.g. From<u8> for Unsigned12Bit).
macro_rules! from_native_type_to_self {
    ($SelfT:ty, $($from:ty)*) => {
        $(
            impl From<$from> for $SelfT {
                fn from(n: $from) -> Self {
                    Self {
                        bits: n.into(),
                    }
                }
            }
        )*
    }
}

/// This macro implements conversions from Unsigned*Bit to native
/// types which are always possible (e.g. From<Unsigned12Bit> for i16).
macro_rules! from_self_to_native_type {
    ($SelfT:ty, $($to:ty)*) => {
        $(
            impl From<$SelfT> for $to {
                fn from(n: $SelfT) -> $to {
                    // The limits of the value are wholly inside the
                    // limits of $to, even when the limits of the
                    // inner type are not, so we cannot use .into()
                    // here.
                    n.bits as $to
                }
            }
        )*
    }
}

/// This macro implements conversions from Unsigned*Bit to native
/// types where the conversion may not always fit.  For example
/// TryFrom<Unsigned12Bit> for u8.
macro_rules! try_from_self_to_native_type {
    ($SelfT:ty, $($to:ty)*) => {
        $(
            impl TryFrom<$SelfT> for $to {
                type Error = ConversionFailed;
                fn try_from(n: $SelfT) -> Result<$to, ConversionFailed> {
                    <$to>::try_from(n.bits).map_err(|_| ConversionFailed::TooLarge)
                }
            }
        )*
    }
}

/// This macro implements a conversions from native types to
/// Unsigned*Bit where the conversion may not always fit.  For example
/// TryFrom<u16> for Unsigned12Bit.
macro_rules! try_from_native_type_to_self {
    ($SelfT:ty, $InnerT:ty, $($from:ty)*) => {
        $(
            impl TryFrom<$from> for $SelfT {
                type Error = ConversionFailed;
                fn try_from(n: $from) -> Result<Self, ConversionFailed> {
                    let bits: $InnerT = match n.try_into() {
                        Err(_) => {
                            // Because $InnerT is unsigned, we know
                            // that n < 0 is always an error case.
                            // For conversions from unsigned types the
                            // comparison is useless (and we expect it
                            // to be optimized away).
                            #[allow(unused_comparisons)]
                            if n < 0 {
                                return Err(ConversionFailed::TooSmall);
                            } else {
                                return Err(ConversionFailed::TooLarge);
                            }
                        }
                        Ok(value) if value > Self::VALUE_BITS => {
                            return Err(ConversionFailed::TooLarge);
                        }
                        Ok(value) => value,
                    };
                    Ok(
                        Self {
                            bits,
                        }
                    )
                }
            }
        )*
    }
}

/// This macro implements the base functionality of the unsigned
/// types.  The `SelfT` argument is the name of the type we are
/// defining.  `BITS` is the bit width of the type we are defining.
/// `InnerT` is the name of the native type which will store those
/// bits.
macro_rules! unsigned_word_impl {
    ($SelfT:ty, $BITS:expr, $InnerT:ty) => {
        impl $SelfT {
            const MODULUS: $InnerT = (1 << $BITS);
            const VALUE_BITS: $InnerT = Self::MODULUS - 1;

            /// The width of this type, in bits.
            pub const BITS: u32 = $BITS;

            pub const MAX: Self = Self {
                bits: Self::MODULUS - 1,
            };

            pub const ZERO: Self = Self { bits: 0 };
            pub const ONE: Self = Self { bits: 1 };
            pub const MIN: Self = Self::ZERO;

            // This will always fail at compile time, so no need to
            // hide it.  It's pub so that it can be used in u12!() and
            // similar.
            pub const fn new<const N: $InnerT>() -> $SelfT {
                type Word = $SelfT;
                struct Helper<const M: $InnerT>;
                impl<const M: $InnerT> Helper<M> {
                    const U: Word = {
                        if M > Word::MAX.bits {
                            panic!("input value is out of range")
                        } else {
                            Word {
                                bits: Word::MAX.bits & M,
                            }
                        }
                    };
                }
                Helper::<N>::U
            }

            /// Keep only the low-order `BITS` bits of `n`.  This is
            /// what the hardware does when a wider value is gated into
            /// a narrower register.
            pub const fn truncating(n: $InnerT) -> Self {
                Self {
                    bits: n & Self::VALUE_BITS,
                }
            }

            pub const fn is_zero(&self) -> bool {
                self.bits == 0
            }

            pub const fn bits(&self) -> $InnerT {
                self.bits
            }

            /// Returns the value of bit `n`, counting from the least
            /// significant end of the word (which is bit 11 in DEC's
            /// own numbering of a 12-bit word).
            pub const fn bit(&self, n: u32) -> bool {
                n < $BITS && (self.bits >> n) & 1 != 0
            }

            /// Add, returning the sum modulo 2^BITS and a flag
            /// indicating whether a carry out of the top bit
            /// occurred.
            pub fn overflowing_add(self, rhs: $SelfT) -> ($SelfT, bool) {
                // Both operands fit in BITS bits, and BITS is always
                // less than the width of $InnerT, so this cannot
                // overflow the native type.
                let sum: $InnerT = self.bits + rhs.bits;
                (Self::truncating(sum), sum > Self::VALUE_BITS)
            }

            /// The next value, wrapping from `MAX` to zero.  This is
            /// the behaviour of the program counter and of ISZ.
            pub fn successor(self) -> $SelfT {
                self.overflowing_add(Self::ONE).0
            }

            /// Rotate the value left by `n` places within its own
            /// width.
            pub fn rotate_left(self, n: u32) -> $SelfT {
                let n = n % $BITS;
                if n == 0 {
                    self
                } else {
                    Self::truncating((self.bits << n) | (self.bits >> ($BITS - n)))
                }
            }

            // We cannot call std::ops::BitAnd in a const because
            // trait methods cannot be const.  So we have this
            // work-alike in impl, since it can be called in a const
            // context.
            pub const fn and(self, mask: $InnerT) -> Self {
                Self {
                    bits: self.bits & mask,
                }
            }

            // We cannot call std::ops::BitOr in a const because trait
            // methods cannot be const.  So we have this work-alike in
            // impl, since it can be called in a const context.
            pub const fn bitor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits | mask) & Self::VALUE_BITS,
                }
            }
        }

        impl Default for $SelfT {
            fn default() -> Self {
                Self { bits: 0 }
            }
        }

        impl Display for $SelfT {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
                Octal::fmt(&self.bits, f)
            }
        }

        impl Octal for $SelfT {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
                Octal::fmt(&self.bits, f)
            }
        }

        impl Debug for $SelfT {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, concat!(stringify!($SelfT), "{{bits: {:#o}}}"), self.bits)
            }
        }

        impl Hash for $SelfT {
            fn hash<H>(&self, state: &mut H)
            where
                H: Hasher,
            {
                self.bits.hash(state)
            }
        }

        impl<T> PartialEq<T> for $SelfT
        where
            T: TryInto<$SelfT> + Copy,
        {
            fn eq(&self, other: &T) -> bool {
                let converted: Result<$SelfT, _> = (*other).try_into();
                match converted {
                    Ok(rhs) => self.bits == rhs.bits,
                    Err(_) => false,
                }
            }
        }

        impl Eq for $SelfT {}

        impl PartialOrd<$SelfT> for $SelfT {
            fn partial_cmp(&self, other: &$SelfT) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl PartialOrd<u32> for $SelfT {
            fn partial_cmp(&self, other: &u32) -> Option<Ordering> {
                match <$SelfT>::try_from(*other) {
                    Ok(value) => Some(self.cmp(&value)),
                    // The error case tells us that `other` doesn't fit
                    // into $SelfT, so `other` must be greater.
                    Err(_) => Some(Ordering::Less),
                }
            }
        }

        impl Ord for $SelfT {
            fn cmp(&self, other: &$SelfT) -> Ordering {
                self.bits.cmp(&other.bits)
            }
        }

        impl std::ops::Not for $SelfT {
            type Output = Self;
            fn not(self) -> Self {
                Self {
                    bits: (!self.bits) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitAnd<$InnerT> for $SelfT {
            type Output = Self;
            fn bitand(self, mask: $InnerT) -> Self {
                Self {
                    bits: self.bits & mask,
                }
            }
        }

        impl std::ops::BitAnd<$SelfT> for $SelfT {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits & rhs.bits,
                }
            }
        }

        impl std::ops::BitAndAssign for $SelfT {
            fn bitand_assign(&mut self, rhs: Self) {
                self.bits &= rhs.bits;
            }
        }

        impl std::ops::BitOr<$InnerT> for $SelfT {
            type Output = Self;
            fn bitor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits | mask) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitOr for $SelfT {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits | rhs.bits,
                }
            }
        }

        impl std::ops::BitOrAssign for $SelfT {
            fn bitor_assign(&mut self, rhs: Self) {
                self.bits |= rhs.bits;
            }
        }

        impl std::ops::BitXor<$InnerT> for $SelfT {
            type Output = Self;
            fn bitxor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits ^ mask) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitXor for $SelfT {
            type Output = Self;
            fn bitxor(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits ^ rhs.bits,
                }
            }
        }
    };
}

/// `Unsigned3Bit` holds a memory field number (IF, DF and the saved
/// copies of these) and the top three bits of an instruction (the
/// IR lights on the front panel).
#[derive(Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Unsigned3Bit {
    pub(crate) bits: u8,
}

/// `Unsigned7Bit` is the page offset held in the bottom seven bits
/// of a memory reference instruction.
#[derive(Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Unsigned7Bit {
    pub(crate) bits: u8,
}

/// `Unsigned12Bit` is the basic machine word of the PDP-8.  This is
/// the width of AC, PC, MA, MB and the switch register, and of every
/// location in memory.
#[derive(Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Unsigned12Bit {
    pub(crate) bits: u16,
}

unsigned_word_impl!(Unsigned3Bit, 3, u8);
unsigned_word_impl!(Unsigned7Bit, 7, u8);
unsigned_word_impl!(Unsigned12Bit, 12, u16);

////////////////////////////////////////////////////////////////////////
// Unsigned3Bit
////////////////////////////////////////////////////////////////////////

// all the things that Unsigned3Bit always fits into
from_self_to_native_type!(Unsigned3Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
// all the things that may not fit into Unsigned3Bit
try_from_native_type_to_self!(Unsigned3Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

////////////////////////////////////////////////////////////////////////
// Unsigned7Bit
////////////////////////////////////////////////////////////////////////

// all the things that Unsigned7Bit always fits into
from_self_to_native_type!(Unsigned7Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
// all the things that may not fit into Unsigned7Bit
try_from_native_type_to_self!(Unsigned7Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

////////////////////////////////////////////////////////////////////////
// Unsigned12Bit
////////////////////////////////////////////////////////////////////////

// all the things that always fit into Unsigned12Bit
from_native_type_to_self!(Unsigned12Bit, u8);
// all the things that Unsigned12Bit always fits into
from_self_to_native_type!(Unsigned12Bit, u16 i16 u32 i32 u64 i64 usize isize);
// all the things that Unsigned12Bit may not fit into
try_from_self_to_native_type!(Unsigned12Bit, u8 i8);
// all the things that may not fit into Unsigned12Bit
try_from_native_type_to_self!(Unsigned12Bit, u16, i8 u16 i16 u32 i32 u64 i64 usize isize);

impl From<Unsigned3Bit> for Unsigned12Bit {
    fn from(n: Unsigned3Bit) -> Self {
        Self {
            bits: n.bits.into(),
        }
    }
}

impl From<Unsigned7Bit> for Unsigned12Bit {
    fn from(n: Unsigned7Bit) -> Self {
        Self {
            bits: n.bits.into(),
        }
    }
}

impl Unsigned12Bit {
    /// The top three bits of the word.  For an instruction, these are
    /// the opcode (what the front panel shows in the IR lights).
    pub const fn top_three_bits(&self) -> Unsigned3Bit {
        Unsigned3Bit {
            // The shift leaves only three significant bits.
            bits: (self.bits >> 9) as u8,
        }
    }

    /// Bits 5..3 (counting from the least significant end).  In an
    /// extended memory IOT these select the field.
    pub const fn middle_field_bits(&self) -> Unsigned3Bit {
        Unsigned3Bit {
            bits: ((self.bits >> 3) & 0o7) as u8,
        }
    }
}

impl Unsigned3Bit {
    /// Widen the field number and move it into bits 5..3 of a word,
    /// which is where RDF, RIF and RIB place it.
    pub const fn shifted_into_bits_5_to_3(&self) -> Unsigned12Bit {
        Unsigned12Bit {
            bits: (self.bits as u16) << 3,
        }
    }
}
