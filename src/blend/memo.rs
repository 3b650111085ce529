//! Row-local caches for runs of identical pixels.
//!
//! Both only ever answer for an exact repeat of their key, so they never change output.

use crate::blend::fast_path::LinearDest;
use crate::foundation::core::Argb;

/// Linear form of the most recent destination pixel.
#[derive(Debug, Default)]
pub(crate) struct DstCache {
    last: Option<LinearDest>,
}

impl DstCache {
    #[inline]
    pub(crate) fn resolve(&mut self, pixel: Argb) -> LinearDest {
        match self.last {
            Some(d) if d.pixel == pixel => d,
            _ => {
                let d = LinearDest::from_pixel(pixel);
                self.last = Some(d);
                d
            }
        }
    }
}

/// Output of the most recent general blend, keyed by `(source, destination, raw alpha)`.
#[derive(Debug)]
pub(crate) struct ResultMemo {
    enabled: bool,
    last: Option<(Argb, Argb, u32, Argb)>,
}

impl ResultMemo {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    #[inline]
    pub(crate) fn lookup(&self, src: Argb, dst: Argb, raw_alpha: u32) -> Option<Argb> {
        match self.last {
            Some((s, d, a, out)) if s == src && d == dst && a == raw_alpha => Some(out),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn store(&mut self, src: Argb, dst: Argb, raw_alpha: u32, out: Argb) {
        if self.enabled {
            self.last = Some((src, dst, raw_alpha, out));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/memo.rs"]
mod tests;
