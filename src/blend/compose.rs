use rayon::prelude::*;

use crate::blend::context::{BlendingContext, PaintSource};
use crate::blend::fast_path::{
    LinearSource, blend_pixel, coverage_alpha, direct_store, fill_opaque,
};
use crate::blend::memo::{DstCache, ResultMemo};
use crate::foundation::config::BlendOpts;
use crate::foundation::core::{Argb, TileBounds, alpha};
use crate::foundation::error::{GammablendError, GammablendResult};
use crate::foundation::math::NORM_BYTE;
use crate::raster::view::{MaskRef, RasterMut, RasterRef};

impl BlendingContext {
    /// Blend the tile `bounds` of `dst` with this context's source.
    ///
    /// `src`, when given, is read at the same coordinates as `dst`; it takes precedence over a
    /// constant source. `mask` is tile-local: its row 0, column 0 covers `(bounds.x, bounds.y)`.
    /// An absent mask means full coverage.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty `bounds` does not fit inside `dst` (or `src`), or `mask` is
    /// smaller than the tile.
    pub fn compose(
        &self,
        dst: &mut RasterMut<'_>,
        src: Option<&RasterRef<'_>>,
        mask: Option<&MaskRef<'_>>,
        bounds: TileBounds,
    ) {
        assert_tile_fits(dst, src, bounds);
        if self.nothing_to_do(src.is_some(), bounds) {
            return;
        }
        if let Some(pixel) = self.opaque_fill(src.is_some(), mask, bounds) {
            fill_opaque(dst, bounds, pixel);
            return;
        }

        let stride = dst.stride();
        let (x, w) = (bounds.x as usize, bounds.w as usize);
        for (j, row) in dst
            .rows_mut(bounds.y, bounds.h)
            .chunks_mut(stride)
            .enumerate()
        {
            let j = j as u32;
            self.compose_row(
                &mut row[x..x + w],
                src.map(|s| s.span(bounds.x, bounds.y + j, bounds.w)),
                mask.map(|m| m.row(j, bounds.w)),
            );
        }
    }

    /// Blend one row span. All slices are the same length when present.
    pub(crate) fn compose_row(&self, dst: &mut [Argb], src: Option<&[Argb]>, mask: Option<&[u8]>) {
        let mut dst_cache = DstCache::default();
        let mut memo = ResultMemo::new(self.memoize());

        for (i, d) in dst.iter_mut().enumerate() {
            let coverage = mask.map_or(NORM_BYTE, |m| u32::from(m[i]));
            if coverage == 0 {
                continue;
            }

            let source = match src {
                Some(s) => {
                    let p = s[i];
                    if alpha(p) == 0 {
                        continue;
                    }
                    LinearSource::from_pixel(p, self.extra_alpha())
                }
                None => match self.constant() {
                    Some(c) => *c,
                    None => return,
                },
            };

            if let Some(p) = direct_store(&source, coverage) {
                *d = p;
                continue;
            }

            let raw = coverage_alpha(source.a, coverage);
            if let Some(out) = memo.lookup(source.pixel, *d, raw) {
                *d = out;
                continue;
            }
            let out = blend_pixel(&source, &dst_cache.resolve(*d), raw);
            memo.store(source.pixel, *d, raw, out);
            *d = out;
        }
    }

    fn nothing_to_do(&self, has_src: bool, bounds: TileBounds) -> bool {
        if bounds.is_empty() {
            return true;
        }
        if has_src {
            return false;
        }
        if self.constant().is_none() {
            tracing::debug!("compose called without a source raster or constant color");
            return true;
        }
        self.is_noop_constant()
    }

    /// Pixel to bulk-fill with: an opaque constant under full coverage of the whole tile.
    fn opaque_fill(
        &self,
        has_src: bool,
        mask: Option<&MaskRef<'_>>,
        bounds: TileBounds,
    ) -> Option<Argb> {
        if has_src {
            return None;
        }
        let pixel = self.constant().filter(|c| c.a == NORM_BYTE)?.pixel;
        mask.is_none_or(|m| m.is_uniform(bounds, u8::MAX))
            .then_some(pixel)
    }
}

fn assert_tile_fits(dst: &RasterMut<'_>, src: Option<&RasterRef<'_>>, bounds: TileBounds) {
    if bounds.is_empty() {
        return;
    }
    if let Err(e) = bounds.check_within(dst.width(), dst.height()) {
        panic!("compose destination: {e}");
    }
    if let Some(s) = src
        && let Err(e) = bounds.check_within(s.width(), s.height())
    {
        panic!("compose source: {e}");
    }
}

/// Same result as [`BlendingContext::compose`], with the tile's rows spread over `pool`.
///
/// # Panics
///
/// Under the same conditions as [`BlendingContext::compose`].
pub fn compose_parallel(
    pool: &rayon::ThreadPool,
    ctx: &BlendingContext,
    dst: &mut RasterMut<'_>,
    src: Option<&RasterRef<'_>>,
    mask: Option<&MaskRef<'_>>,
    bounds: TileBounds,
) {
    assert_tile_fits(dst, src, bounds);
    if ctx.nothing_to_do(src.is_some(), bounds) {
        return;
    }
    let fill = ctx.opaque_fill(src.is_some(), mask, bounds);

    let stride = dst.stride();
    let (x, w) = (bounds.x as usize, bounds.w as usize);
    let rows = dst.rows_mut(bounds.y, bounds.h);
    pool.install(|| {
        rows.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(j, row)| {
                let span = &mut row[x..x + w];
                if let Some(pixel) = fill {
                    span.fill(pixel);
                    return;
                }
                let j = j as u32;
                ctx.compose_row(
                    span,
                    src.map(|s| s.span(bounds.x, bounds.y + j, bounds.w)),
                    mask.map(|m| m.row(j, bounds.w)),
                );
            });
    });
}

/// Build the worker pool used for row-parallel compositing.
pub fn build_thread_pool(threads: Option<usize>) -> GammablendResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(GammablendError::validation(
            "blend threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        GammablendError::from(anyhow::Error::new(e).context("failed to build rayon thread pool"))
    })
}

/// Long-lived compositor front end: options plus an optional worker pool.
///
/// Contexts it hands out follow its options; [`compose`](Self::compose) picks the parallel
/// path for tiles of at least `threading.min_rows` rows when threading is enabled.
#[derive(Debug)]
pub struct Compositor {
    opts: BlendOpts,
    pool: Option<rayon::ThreadPool>,
}

impl Compositor {
    /// Validate `opts` and build the worker pool if threading is enabled.
    pub fn new(opts: BlendOpts) -> GammablendResult<Self> {
        opts.validate()?;
        let pool = if opts.threading.parallel {
            Some(build_thread_pool(opts.threading.threads)?)
        } else {
            None
        };
        Ok(Self { opts, pool })
    }

    /// Options in effect.
    pub fn opts(&self) -> &BlendOpts {
        &self.opts
    }

    /// Initialised context for one drawing operation.
    pub fn context(&self, extra_alpha: f32, source: PaintSource) -> BlendingContext {
        let mut ctx = BlendingContext::with_opts(&self.opts);
        ctx.init(extra_alpha, source);
        ctx
    }

    /// Compose one tile with `ctx`, in parallel when worthwhile.
    pub fn compose(
        &self,
        ctx: &BlendingContext,
        dst: &mut RasterMut<'_>,
        src: Option<&RasterRef<'_>>,
        mask: Option<&MaskRef<'_>>,
        bounds: TileBounds,
    ) {
        match &self.pool {
            Some(pool) if bounds.h as usize >= self.opts.threading.min_rows => {
                compose_parallel(pool, ctx, dst, src, mask, bounds)
            }
            _ => ctx.compose(dst, src, mask, bounds),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/compose.rs"]
mod tests;
