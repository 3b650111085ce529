use crate::foundation::error::{GammablendError, GammablendResult};

/// Packed non-premultiplied sRGB pixel, `0xAARRGGBB`.
pub type Argb = u32;

/// Alpha byte of a packed pixel.
#[inline(always)]
pub fn alpha(p: Argb) -> u32 {
    (p >> 24) & 0xFF
}

/// Red byte of a packed pixel.
#[inline(always)]
pub fn red(p: Argb) -> u32 {
    (p >> 16) & 0xFF
}

/// Green byte of a packed pixel.
#[inline(always)]
pub fn green(p: Argb) -> u32 {
    (p >> 8) & 0xFF
}

/// Blue byte of a packed pixel.
#[inline(always)]
pub fn blue(p: Argb) -> u32 {
    p & 0xFF
}

/// Pack four 8-bit components (higher bits are ignored).
#[inline(always)]
pub fn pack_argb(a: u32, r: u32, g: u32, b: u32) -> Argb {
    ((a & 0xFF) << 24) | ((r & 0xFF) << 16) | ((g & 0xFF) << 8) | (b & 0xFF)
}

/// Tile rectangle in destination pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TileBounds {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl TileBounds {
    /// Build bounds from origin and size.
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Return `true` when the tile covers no pixels.
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Exclusive right edge.
    pub fn right(self) -> u64 {
        u64::from(self.x) + u64::from(self.w)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u64 {
        u64::from(self.y) + u64::from(self.h)
    }

    /// Ensure the tile fits inside a `width x height` surface.
    pub fn check_within(self, width: u32, height: u32) -> GammablendResult<()> {
        if self.right() > u64::from(width) || self.bottom() > u64::from(height) {
            return Err(GammablendError::validation(format!(
                "tile {}x{}+{}+{} exceeds {}x{} surface",
                self.w, self.h, self.x, self.y, width, height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
