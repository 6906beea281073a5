use super::{ConversionFailed, Unsigned12Bit, Unsigned3Bit, Unsigned7Bit};
use crate::{u12, u3};

macro_rules! assert_octal_eq {
    ($left:expr, $right:expr $(,)?) => {{
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    panic!(
                        "Assertion failed: {:>#06o} != {:>#06o}",
                        left_val, right_val
                    );
                }
            }
        }
    }};
}

#[test]
fn test_limits() {
    assert_eq!(Unsigned12Bit::MAX.bits, 0o7777);
    assert_eq!(Unsigned12Bit::MIN.bits, 0);
    assert_eq!(Unsigned7Bit::MAX.bits, 0o177);
    assert_eq!(Unsigned3Bit::MAX.bits, 0o7);
}

#[test]
fn test_from_u8() {
    assert_eq!(Unsigned12Bit::from(0_u8).bits, 0_u16);
    assert_eq!(Unsigned12Bit::from(1_u8).bits, 1_u16);
    assert_eq!(Unsigned12Bit::from(0o377_u8).bits, 0o377_u16);
}

#[test]
fn test_try_from_u16() {
    assert_eq!(
        Unsigned12Bit::try_from(0o7777_u16),
        Ok(Unsigned12Bit::MAX)
    );
    assert_eq!(
        Unsigned12Bit::try_from(0o10000_u16),
        Err(ConversionFailed::TooLarge)
    );
    assert_eq!(
        Unsigned12Bit::try_from(-1_i32),
        Err(ConversionFailed::TooSmall)
    );
    assert_eq!(Unsigned3Bit::try_from(8_u8), Err(ConversionFailed::TooLarge));
    assert_eq!(
        Unsigned7Bit::try_from(0o200_u16),
        Err(ConversionFailed::TooLarge)
    );
}

#[test]
fn test_try_from_unsigned12bit_u8() {
    assert_eq!(u8::try_from(Unsigned12Bit::from(0o377_u8)), Ok(0o377_u8));
    assert_eq!(
        u8::try_from(Unsigned12Bit { bits: 0o400 }),
        Err(ConversionFailed::TooLarge)
    );
}

#[test]
fn test_truncating() {
    assert_octal_eq!(Unsigned12Bit::truncating(0o17777).bits, 0o7777);
    assert_octal_eq!(Unsigned12Bit::truncating(0o10000).bits, 0);
    assert_octal_eq!(Unsigned7Bit::truncating(0o377).bits, 0o177);
}

#[test]
fn test_overflowing_add() {
    assert_eq!(
        Unsigned12Bit::MAX.overflowing_add(Unsigned12Bit::ONE),
        (Unsigned12Bit::ZERO, true)
    );
    assert_eq!(
        u12!(0o3777).overflowing_add(Unsigned12Bit::ONE),
        (u12!(0o4000), false)
    );
}

#[test]
fn test_successor_wraps() {
    assert_eq!(Unsigned12Bit::MAX.successor(), Unsigned12Bit::ZERO);
    assert_eq!(u12!(0o200).successor(), u12!(0o201));
    assert_eq!(Unsigned3Bit::MAX.successor(), Unsigned3Bit::ZERO);
}

#[test]
fn test_not() {
    assert_octal_eq!((!Unsigned12Bit::ZERO).bits, 0o7777);
    assert_octal_eq!((!u12!(0o5252)).bits, 0o2525);
}

#[test]
fn test_bit_operators() {
    assert_eq!(u12!(0o7070) & u12!(0o0770), u12!(0o0070));
    assert_eq!(u12!(0o7000) | u12!(0o0007), u12!(0o7007));
    assert_eq!(u12!(0o7000) ^ u12!(0o7007), u12!(0o0007));
    assert_eq!(u12!(0o7777) & 0o17_u16, u12!(0o17));
    assert_eq!(Unsigned12Bit::ZERO.bitor(0o177777), Unsigned12Bit::MAX);
}

#[test]
fn test_bit() {
    let w = u12!(0o4001);
    assert!(w.bit(0));
    assert!(!w.bit(1));
    assert!(w.bit(11));
    assert!(!w.bit(12));
}

#[test]
fn test_rotate() {
    assert_eq!(u12!(0o4000).rotate_left(1), u12!(0o0001));
    assert_eq!(u12!(0o1234).rotate_left(6), u12!(0o3412));
    assert_eq!(u12!(0o1234).rotate_left(12), u12!(0o1234));
    assert_eq!(u12!(0o0003).rotate_left(10), u12!(0o6000));
}

#[test]
fn test_field_bits() {
    let w = u12!(0o6253);
    assert_eq!(w.top_three_bits(), u3!(6));
    assert_eq!(w.middle_field_bits(), u3!(5));
    assert_eq!(u3!(5).shifted_into_bits_5_to_3(), u12!(0o50));
}

#[test]
fn test_display_is_octal() {
    assert_eq!(format!("{}", u12!(0o7777)), "7777");
    assert_eq!(format!("{:04o}", u12!(0o12)), "0012");
    assert_eq!(format!("{:?}", u3!(5)), "Unsigned3Bit{bits: 0o5}");
}

#[test]
fn test_compare_with_native() {
    assert_eq!(u12!(0o17), 0o17_u16);
    assert!(u12!(0o17) != 0o20000_u32);
    assert!(u12!(0o7777) < 0o10000_u32);
    assert!(u12!(0o10) > u12!(0o7));
}

#[cfg(test)]
mod u12_proptests {
    use super::super::Unsigned12Bit;
    use test_strategy::{proptest, Arbitrary};

    #[derive(Arbitrary, Debug)]
    struct AdditionInput {
        #[strategy(0..=0o7777_u16)]
        left: u16,
        #[strategy(0..=0o7777_u16)]
        right: u16,
    }

    #[proptest]
    fn overflowing_add_matches_native_arithmetic(input: AdditionInput) {
        let left = Unsigned12Bit::try_from(input.left).unwrap();
        let right = Unsigned12Bit::try_from(input.right).unwrap();
        let (sum, carry) = left.overflowing_add(right);
        let native = u32::from(input.left) + u32::from(input.right);
        assert_eq!(u32::from(sum), native & 0o7777);
        assert_eq!(carry, native > 0o7777);
    }

    #[proptest]
    fn rotation_is_reversible(#[strategy(0..=0o7777_u16)] bits: u16, #[strategy(0..24_u32)] n: u32) {
        let w = Unsigned12Bit::try_from(bits).unwrap();
        assert_eq!(w.rotate_left(n).rotate_left(24 - n), w);
    }
}
