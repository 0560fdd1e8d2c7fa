//! Width-restricted operand helpers shared by the ALU opcodes.

use crate::encoding::Width;

/// Applies `op` to the low `width` bits of `dest` and `src`, keeping the
/// bits of `dest` above `width` untouched.
///
/// The result of `op` is truncated to `width`, so arithmetic wraps modulo
/// 2^width.
#[must_use]
pub fn apply_at_width(dest: u32, src: u32, width: Width, op: impl FnOnce(u32, u32) -> u32) -> u32 {
    let mask = width.mask();
    (dest & !mask) | (op(dest & mask, src & mask) & mask)
}

/// `ASR` result for `src` at `width`.
///
/// The width's sign bit and every bit above the width are kept from `src`;
/// the bit just below the sign bit is cleared rather than replicated.
#[must_use]
pub const fn arithmetic_shift_right(src: u32, width: Width) -> u32 {
    let mask = width.mask();
    let sign = width.sign_bit();
    ((src >> 1) & (mask & !(sign >> 1))) | (src & sign) | (src & !mask)
}

/// `ASL` result for `src` at `width`.
///
/// The shifted value loses its top bit; the original sign bit and every bit
/// above the width are kept from `src`.
#[must_use]
pub const fn arithmetic_shift_left(src: u32, width: Width) -> u32 {
    let mask = width.mask();
    let sign = width.sign_bit();
    ((src << 1) & (mask & !sign)) | (src & sign) | (src & !mask)
}

/// Interprets the low `width` bits of `value` as a two's-complement integer.
#[must_use]
pub const fn to_signed(value: u32, width: Width) -> i32 {
    let shift = 32 - width.bits();
    ((value << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{apply_at_width, arithmetic_shift_left, arithmetic_shift_right, to_signed};
    use crate::encoding::Width;

    #[rstest]
    #[case(Width::Word, 0xFFFF_FFFF, 1, 0)]
    #[case(Width::Half, 0xAAAA_FFFF, 1, 0xAAAA_0000)]
    #[case(Width::Byte, 0x1234_56FF, 2, 0x1234_5601)]
    fn addition_wraps_inside_width(
        #[case] width: Width,
        #[case] dest: u32,
        #[case] src: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(apply_at_width(dest, src, width, u32::wrapping_add), expected);
    }

    #[rstest]
    #[case(Width::Word, 0, 1, 0xFFFF_FFFF)]
    #[case(Width::Half, 0x1234_0000, 1, 0x1234_FFFF)]
    #[case(Width::Byte, 0xABCD_EF00, 1, 0xABCD_EFFF)]
    fn subtraction_borrows_inside_width(
        #[case] width: Width,
        #[case] dest: u32,
        #[case] src: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(apply_at_width(dest, src, width, u32::wrapping_sub), expected);
    }

    #[rstest]
    #[case(0x8000_0001, Width::Word, 0x8000_0000)]
    #[case(0x4000_0000, Width::Word, 0x2000_0000)]
    #[case(0x0000_0004, Width::Word, 0x0000_0002)]
    #[case(0x0001_8000, Width::Half, 0x0001_8000)]
    #[case(0x0002_0000, Width::Half, 0x0002_0000)]
    #[case(0x0000_0080, Width::Byte, 0x0000_0080)]
    #[case(0xFF00_00FE, Width::Byte, 0xFF00_00BF)]
    fn arithmetic_shift_right_reproduces_masks(
        #[case] src: u32,
        #[case] width: Width,
        #[case] expected: u32,
    ) {
        assert_eq!(arithmetic_shift_right(src, width), expected);
    }

    #[rstest]
    #[case(0x8000_0001, Width::Word, 0x8000_0002)]
    #[case(0x4000_0000, Width::Word, 0x0000_0000)]
    #[case(0x0001_C001, Width::Half, 0x0001_8002)]
    #[case(0x0000_0041, Width::Byte, 0x0000_0002)]
    #[case(0x1200_00C0, Width::Byte, 0x1200_0080)]
    fn arithmetic_shift_left_reproduces_masks(
        #[case] src: u32,
        #[case] width: Width,
        #[case] expected: u32,
    ) {
        assert_eq!(arithmetic_shift_left(src, width), expected);
    }

    #[rstest]
    #[case(0x0000_0080, Width::Byte, -128)]
    #[case(0xFFFF_FF7F, Width::Byte, 127)]
    #[case(0x0000_FFFF, Width::Half, -1)]
    #[case(0x0001_7FFF, Width::Half, 32767)]
    #[case(0x8000_0000, Width::Word, i32::MIN)]
    #[case(0x7FFF_FFFF, Width::Word, i32::MAX)]
    fn signed_view_sign_extends_at_width(
        #[case] value: u32,
        #[case] width: Width,
        #[case] expected: i32,
    ) {
        assert_eq!(to_signed(value, width), expected);
    }

    proptest! {
        #[test]
        fn sub_word_ops_never_touch_high_bits(dest: u32, src: u32, half: bool) {
            let width = if half { Width::Half } else { Width::Byte };
            let high = !width.mask();
            for result in [
                apply_at_width(dest, src, width, |_, s| s),
                apply_at_width(dest, src, width, u32::wrapping_add),
                apply_at_width(dest, src, width, u32::wrapping_sub),
                apply_at_width(dest, src, width, |d, s| d ^ s),
                apply_at_width(dest, src, width, |_, s| s << 1),
            ] {
                prop_assert_eq!(result & high, dest & high);
            }
        }

        #[test]
        fn word_width_matches_plain_arithmetic(dest: u32, src: u32) {
            prop_assert_eq!(
                apply_at_width(dest, src, Width::Word, u32::wrapping_add),
                dest.wrapping_add(src)
            );
            prop_assert_eq!(
                apply_at_width(dest, src, Width::Word, |_, s| s >> 1),
                src >> 1
            );
        }
    }
}
