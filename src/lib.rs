//! gammablend is the pixel back end of an anti-aliased software rasterizer.
//!
//! It composes a constant color or a per-pixel source over an ARGB framebuffer through a
//! coverage mask, in linear light, with perceptual alpha correction. The API is
//! context-oriented:
//!
//! - Create a [`BlendingContext`] (or ask a [`Compositor`] for one) and `init` it per drawing
//!   operation
//! - Call [`BlendingContext::compose`] per tile with [`RasterMut`], [`RasterRef`] and
//!   [`MaskRef`] views over caller memory
//! - Take mask rows and other scratch arrays from a per-thread [`ScratchPool`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod blend;
mod foundation;
mod lut;
mod pool;
mod raster;

pub use crate::foundation::alloc_track::{AllocDelta, AllocRegion};
pub use crate::foundation::config::{BlendOpts, BlendThreading, PoolOpts};
pub use crate::foundation::core::{Argb, TileBounds, alpha, blue, green, pack_argb, red};
pub use crate::foundation::error::{GammablendError, GammablendResult};

pub use crate::lut::alpha::{
    AlphaLut, AlphaTable, LUMINANCE_BUCKETS, SourceAlphaTables, luminance_bucket,
};
pub use crate::lut::gamma::{GammaLut, LINEAR_MAX};

pub use crate::pool::cache::{ArrayCache, BucketStats, PoolElement, PoolStats};
pub use crate::pool::reference::{ScratchPool, ScratchRef};
pub use crate::pool::size_class::{SizeClasses, grown_size};

pub use crate::raster::view::{MaskRef, RasterMut, RasterRef};

pub use crate::blend::compose::{Compositor, build_thread_pool, compose_parallel};
pub use crate::blend::context::{BlendingContext, PaintSource};
pub use crate::blend::fast_path::{
    LinearDest, LinearSource, blend_pixel, coverage_alpha, direct_store, fill_opaque,
    scale_extra_alpha,
};
