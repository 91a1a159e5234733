//! Two's-complement width arithmetic.
//!
//! Widths are bit counts in `1..=64`. Out-of-range widths are clamped into
//! that range before use: a width of 0 behaves as 1 and anything above 64
//! behaves as 64.

pub const MAX_WIDTH: u32 = 64;

fn clamp(width: u32) -> u32 {
    width.clamp(1, MAX_WIDTH)
}

/// All-ones mask of the lowest `width` bits.
pub fn mask(width: u32) -> u64 {
    let width = clamp(width);
    if width == MAX_WIDTH {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reinterpret `value`, an `original_width`-bit integer, at `target_width` bits.
///
/// When `is_signed` and the sign bit at `original_width` is set, the bits above
/// `original_width` are filled with ones before masking; otherwise the value is
/// masked (zero-extended or truncated). Only the lowest `target_width` bits of
/// the result can be set.
pub fn extend(value: i64, target_width: u32, is_signed: bool, original_width: u32) -> i64 {
    let original_width = clamp(original_width);
    let bits = value as u64;
    let sign_bit = 1u64 << (original_width - 1);

    let widened = if is_signed && bits & sign_bit != 0 {
        bits | !mask(original_width)
    } else {
        bits
    };
    (widened & mask(target_width)) as i64
}

/// The lowest `width` bits of `value`, least significant first.
pub fn to_bits(value: i64, width: u32) -> Vec<bool> {
    (0..clamp(width)).map(|i| (value >> i) & 1 == 1).collect()
}

/// Integer value of `bits` (least significant first), replicating the top bit when `is_signed`.
pub fn from_bits(bits: &[bool], is_signed: bool) -> i64 {
    assert!(
        !bits.is_empty() && bits.len() <= MAX_WIDTH as usize,
        "Width should be in the range 1..=64"
    );

    let raw = bits
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | ((b as u64) << i));
    let width = bits.len() as u32;
    if is_signed {
        extend(raw as i64, MAX_WIDTH, true, width)
    } else {
        raw as i64
    }
}
