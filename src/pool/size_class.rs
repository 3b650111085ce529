use crate::foundation::config::PoolOpts;

/// Fixed buffer lengths a cache recycles, smallest first, each 4x the previous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeClasses {
    sizes: Vec<usize>,
}

impl SizeClasses {
    /// Classes described by validated options.
    pub fn new(opts: &PoolOpts) -> Self {
        let mut sizes = Vec::with_capacity(opts.bucket_count);
        let mut size = opts.min_array_size;
        for _ in 0..opts.bucket_count {
            sizes.push(size);
            size = size.saturating_mul(4);
        }
        Self { sizes }
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Always `false` for validated options.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Length of class `i`.
    pub fn size(&self, i: usize) -> usize {
        self.sizes[i]
    }

    /// Largest class; longer buffers are never cached.
    pub fn max(&self) -> usize {
        self.sizes.last().copied().unwrap_or(0)
    }

    /// Index of the smallest class holding at least `len` elements.
    pub fn class_for(&self, len: usize) -> Option<usize> {
        self.sizes.iter().position(|&s| s >= len)
    }

    /// Index of the class whose length is exactly `len`.
    pub fn class_of(&self, len: usize) -> Option<usize> {
        self.sizes.binary_search(&len).ok()
    }
}

const GROW_ALIGN_SHIFT: u32 = 12;

/// Length to request when a buffer holding `used` elements must fit `needed`.
///
/// Doubles `used` (1.5x above `threshold`); when that does not strictly exceed `needed`,
/// falls back to `needed` rounded up past the next 4096 boundary.
pub fn grown_size(used: usize, needed: usize, threshold: usize) -> usize {
    let size = if used > threshold {
        used.saturating_add(used >> 1)
    } else {
        used.saturating_mul(2)
    };
    if size > needed {
        return size;
    }
    ((needed >> GROW_ALIGN_SHIFT) + 1)
        .checked_shl(GROW_ALIGN_SHIFT)
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/pool/size_class.rs"]
mod tests;
