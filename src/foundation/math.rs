/// Full-scale 8-bit channel value.
pub(crate) const NORM_BYTE: u32 = 255;

/// Full-scale 7-bit extra alpha.
pub(crate) const NORM_BYTE7: u32 = 127;

/// Division by 255 without a divide, for products of two 8-bit factors.
///
/// `(x + ((x + 257) >> 8)) >> 8`: exact on multiples of 255 and within 1 of `x / 255`
/// over `[0, 255 * 255]`.
#[inline(always)]
pub(crate) fn div255(x: u32) -> u32 {
    (x + ((x + 257) >> 8)) >> 8
}

/// `a * b / 255` for 8-bit `a` and `b`, via [`div255`].
#[inline(always)]
pub(crate) fn mul_div255(a: u32, b: u32) -> u32 {
    div255(a * b)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
