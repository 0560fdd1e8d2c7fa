//! Condition bits written by `CND` into the low nibble of `regj`.

/// `regi` compared greater than `regj`.
pub const CND_GREATER: u32 = 1 << 0;
/// `regi` compared less than `regj`.
pub const CND_LESS: u32 = 1 << 1;
/// Operands compared equal.
pub const CND_EQUAL: u32 = 1 << 2;
/// Bits cleared before the comparison result is written (bit 3 stays zero).
pub const CND_FLAGS_MASK: u32 = 0xF;

/// Condition bits for a signed comparison of `regi` against `regj`.
#[must_use]
pub const fn compare_flags(regi: i32, regj: i32) -> u32 {
    if regi > regj {
        CND_GREATER
    } else if regi < regj {
        CND_LESS
    } else {
        CND_EQUAL
    }
}
