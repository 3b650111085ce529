use crate::blend::fast_path::LinearSource;
use crate::foundation::config::BlendOpts;
use crate::foundation::core::{Argb, alpha};
use crate::foundation::math::NORM_BYTE7;

/// Where source pixels come from for one drawing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintSource {
    /// One color for every pixel, resolved once at [`BlendingContext::init`].
    Constant(Argb),
    /// A source raster passed to each `compose` call.
    PerPixel,
}

/// Per-operation compositing state: initialise once, then compose tile after tile.
///
/// A context is cheap to build and is meant to be discarded at the end of the operation.
#[derive(Clone, Debug)]
pub struct BlendingContext {
    extra_alpha: u32,
    constant: Option<LinearSource>,
    memoize: bool,
}

impl Default for BlendingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BlendingContext {
    /// Context with full extra alpha, no constant source, and result memoisation on.
    pub fn new() -> Self {
        Self::with_opts(&BlendOpts::default())
    }

    /// Context honoring `opts.memoize_results`.
    pub fn with_opts(opts: &BlendOpts) -> Self {
        Self {
            extra_alpha: NORM_BYTE7,
            constant: None,
            memoize: opts.memoize_results,
        }
    }

    /// Prepare for a drawing operation.
    ///
    /// `extra_alpha` is an opacity multiplier, clamped to `[0, 1]` and quantised to 7 bits.
    /// A constant source has the extra alpha folded into its own alpha here.
    pub fn init(&mut self, extra_alpha: f32, source: PaintSource) -> &mut Self {
        let f = if extra_alpha.is_nan() {
            0.0
        } else {
            extra_alpha.clamp(0.0, 1.0)
        };
        self.extra_alpha = (NORM_BYTE7 as f32 * f).round() as u32;
        self.constant = match source {
            PaintSource::Constant(pixel) => Some(LinearSource::from_pixel(pixel, self.extra_alpha)),
            PaintSource::PerPixel => None,
        };
        tracing::trace!(
            extra_alpha = self.extra_alpha,
            constant = self.constant.map(|c| c.pixel),
            "blending context initialised"
        );
        self
    }

    /// 7-bit extra alpha, `127` meaning fully opaque.
    pub fn extra_alpha(&self) -> u32 {
        self.extra_alpha
    }

    /// Constant source pixel with the extra alpha folded in, if the source is constant.
    pub fn constant_pixel(&self) -> Option<Argb> {
        self.constant.map(|c| c.pixel)
    }

    /// Whether runs of identical inputs reuse the previous output.
    pub fn memoize(&self) -> bool {
        self.memoize
    }

    pub(crate) fn constant(&self) -> Option<&LinearSource> {
        self.constant.as_ref()
    }

    /// Constant source that can never change the destination.
    pub(crate) fn is_noop_constant(&self) -> bool {
        self.constant.is_some_and(|c| alpha(c.pixel) == 0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/context.rs"]
mod tests;
