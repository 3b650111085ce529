//! Per-pixel building blocks of `compose`.
//!
//! Each shortcut here produces exactly what [`blend_pixel`] would produce on its
//! precondition's inputs; the unit tests check that equivalence at the boundary of each one.

use crate::foundation::core::{Argb, TileBounds, alpha, blue, green, pack_argb, red};
use crate::foundation::math::{NORM_BYTE, NORM_BYTE7, div255, mul_div255};
use crate::lut::alpha::{AlphaLut, SourceAlphaTables, luminance_bucket};
use crate::lut::gamma::GammaLut;
use crate::raster::view::RasterMut;

/// Scale a source alpha by 7-bit extra alpha.
///
/// Identity at `extra_alpha == 127`; otherwise `div255(sa * (extra_alpha << 1))`, so full
/// opacity never survives a reduced extra alpha.
#[inline(always)]
pub fn scale_extra_alpha(sa: u32, extra_alpha: u32) -> u32 {
    if extra_alpha == NORM_BYTE7 {
        return sa;
    }
    div255(sa * (extra_alpha << 1))
}

/// Source pixel converted to linear light, with its alpha tables selected.
#[derive(Clone, Copy, Debug)]
pub struct LinearSource {
    /// Packed pixel with the effective (extra-alpha scaled) alpha.
    pub pixel: Argb,
    /// Effective alpha in `[0, 255]`.
    pub a: u32,
    /// Linear red in `[0, LINEAR_MAX]`.
    pub r: u32,
    /// Linear green in `[0, LINEAR_MAX]`.
    pub g: u32,
    /// Linear blue in `[0, LINEAR_MAX]`.
    pub b: u32,
    /// Alpha tables for this source's luminance bucket.
    pub tables: &'static SourceAlphaTables,
}

impl LinearSource {
    /// Convert `pixel`, folding `extra_alpha` into its alpha.
    #[inline]
    pub fn from_pixel(pixel: Argb, extra_alpha: u32) -> Self {
        let lut = GammaLut::get();
        let a = scale_extra_alpha(alpha(pixel), extra_alpha);
        let r = lut.to_linear(red(pixel));
        let g = lut.to_linear(green(pixel));
        let b = lut.to_linear(blue(pixel));
        Self {
            pixel: (pixel & 0x00FF_FFFF) | (a << 24),
            a,
            r,
            g,
            b,
            tables: AlphaLut::get().source_tables(luminance_bucket(r, g, b)),
        }
    }
}

/// Destination pixel converted to linear light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearDest {
    /// Packed pixel this was derived from.
    pub pixel: Argb,
    /// Alpha in `[0, 255]`.
    pub a: u32,
    /// Linear red.
    pub r: u32,
    /// Linear green.
    pub g: u32,
    /// Linear blue.
    pub b: u32,
    /// Luminance bucket, the second alpha-table axis.
    pub bucket: usize,
}

impl LinearDest {
    /// Convert `pixel`.
    #[inline]
    pub fn from_pixel(pixel: Argb) -> Self {
        let lut = GammaLut::get();
        let r = lut.to_linear(red(pixel));
        let g = lut.to_linear(green(pixel));
        let b = lut.to_linear(blue(pixel));
        Self {
            pixel,
            a: alpha(pixel),
            r,
            g,
            b,
            bucket: luminance_bucket(r, g, b),
        }
    }
}

/// Raw blend alpha: source alpha weighted by coverage.
#[inline(always)]
pub fn coverage_alpha(sa: u32, coverage: u32) -> u32 {
    mul_div255(sa, coverage)
}

/// General source-over blend in linear light.
///
/// `raw_alpha` is [`coverage_alpha`]'s result; it is perceptually corrected through the
/// source's table for the destination bucket, then `fs = α`, `fd = da * (255 - α) / 255`.
#[inline]
pub fn blend_pixel(src: &LinearSource, dst: &LinearDest, raw_alpha: u32) -> Argb {
    let a = u32::from(src.tables[dst.bucket][(raw_alpha & NORM_BYTE) as usize]);

    let fs = a;
    let fd = mul_div255(dst.a, NORM_BYTE - a);
    let out = fs + fd;
    if out == 0 {
        return 0;
    }

    // 15-bit channels times 8-bit factors: no overflow.
    let r = (src.r * fs + dst.r * fd) / out;
    let g = (src.g * fs + dst.g * fd) / out;
    let b = (src.b * fs + dst.b * fd) / out;

    let lut = GammaLut::get();
    pack_argb(out, lut.to_srgb(r), lut.to_srgb(g), lut.to_srgb(b))
}

/// Full coverage of a fully opaque source: the result is the source pixel itself.
#[inline(always)]
pub fn direct_store(src: &LinearSource, coverage: u32) -> Option<Argb> {
    (coverage == NORM_BYTE && src.a == NORM_BYTE).then_some(src.pixel)
}

/// Opaque constant source under full coverage: overwrite the whole tile.
pub fn fill_opaque(dst: &mut RasterMut<'_>, bounds: TileBounds, pixel: Argb) {
    for y in bounds.y..bounds.y + bounds.h {
        dst.span_mut(bounds.x, y, bounds.w).fill(pixel);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/fast_path.rs"]
mod tests;
