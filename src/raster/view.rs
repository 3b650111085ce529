use crate::foundation::core::{Argb, TileBounds};
use crate::foundation::error::{GammablendError, GammablendResult};

fn check_geometry(len: usize, width: u32, height: u32, stride: usize) -> GammablendResult<()> {
    if stride < width as usize {
        return Err(GammablendError::validation(format!(
            "stride {stride} is smaller than width {width}"
        )));
    }
    let needed = if height == 0 || width == 0 {
        0
    } else {
        (height as usize - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(width as usize))
            .ok_or_else(|| GammablendError::validation("raster size overflow"))?
    };
    if len < needed {
        return Err(GammablendError::validation(format!(
            "buffer of {len} elements is too small for {width}x{height} with stride {stride}"
        )));
    }
    Ok(())
}

/// Read-only strided view of ARGB pixels owned by the caller.
#[derive(Clone, Copy, Debug)]
pub struct RasterRef<'a> {
    data: &'a [Argb],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> RasterRef<'a> {
    /// View `data` as `height` rows of `width` pixels, rows `stride` pixels apart.
    pub fn new(data: &'a [Argb], width: u32, height: u32, stride: usize) -> GammablendResult<Self> {
        check_geometry(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between row starts, in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Argb {
        self.data[y as usize * self.stride + x as usize]
    }

    /// `w` pixels of row `y` starting at column `x`.
    #[inline]
    pub(crate) fn span(&self, x: u32, y: u32, w: u32) -> &'a [Argb] {
        let start = y as usize * self.stride + x as usize;
        &self.data[start..start + w as usize]
    }
}

/// Mutable strided view of ARGB pixels owned by the caller.
#[derive(Debug)]
pub struct RasterMut<'a> {
    data: &'a mut [Argb],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> RasterMut<'a> {
    /// View `data` as `height` rows of `width` pixels, rows `stride` pixels apart.
    pub fn new(
        data: &'a mut [Argb],
        width: u32,
        height: u32,
        stride: usize,
    ) -> GammablendResult<Self> {
        check_geometry(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between row starts, in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Argb {
        self.data[y as usize * self.stride + x as usize]
    }

    /// Read-only view of the same pixels.
    pub fn as_view(&self) -> RasterRef<'_> {
        RasterRef {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// `w` pixels of row `y` starting at column `x`.
    #[inline]
    pub(crate) fn span_mut(&mut self, x: u32, y: u32, w: u32) -> &mut [Argb] {
        let start = y as usize * self.stride + x as usize;
        &mut self.data[start..start + w as usize]
    }

    /// Pixels of rows `y..y + h`, starting at the first row's column 0.
    ///
    /// Splitting this into `stride`-long chunks yields one chunk per row; the last may be
    /// shorter than `stride` but always holds the row's `width` pixels.
    pub(crate) fn rows_mut(&mut self, y: u32, h: u32) -> &mut [Argb] {
        let start = y as usize * self.stride;
        let end = (start + h as usize * self.stride).min(self.data.len());
        &mut self.data[start..end]
    }
}

/// Coverage mask: one byte per pixel, tile-local, with its own offset and stride.
#[derive(Clone, Copy, Debug)]
pub struct MaskRef<'a> {
    data: &'a [u8],
    offset: usize,
    stride: usize,
}

impl<'a> MaskRef<'a> {
    /// Mask for tiles up to `width x height`, first byte at `offset`, rows `stride` apart.
    pub fn new(
        data: &'a [u8],
        offset: usize,
        stride: usize,
        width: u32,
        height: u32,
    ) -> GammablendResult<Self> {
        let tail = data.len().checked_sub(offset).ok_or_else(|| {
            GammablendError::validation(format!(
                "mask offset {offset} exceeds buffer of {} bytes",
                data.len()
            ))
        })?;
        check_geometry(tail, width, height, stride)?;
        Ok(Self {
            data,
            offset,
            stride,
        })
    }

    /// Distance between row starts, in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Coverage bytes for tile row `j`, `w` long.
    #[inline]
    pub(crate) fn row(&self, j: u32, w: u32) -> &'a [u8] {
        let start = self.offset + j as usize * self.stride;
        &self.data[start..start + w as usize]
    }

    /// Return `true` when every byte of the tile is `value`.
    pub fn is_uniform(&self, bounds: TileBounds, value: u8) -> bool {
        (0..bounds.h).all(|j| self.row(j, bounds.w).iter().all(|&c| c == value))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/view.rs"]
mod tests;
