use std::fmt;

use serde::Serialize;

use crate::foundation::config::PoolOpts;
use crate::foundation::error::GammablendResult;
use crate::pool::size_class::SizeClasses;

/// Element types a scratch cache can recycle. `Default` must be the zero value.
pub trait PoolElement: Copy + Default + PartialEq + fmt::Debug + 'static {}

impl PoolElement for u8 {}
impl PoolElement for i32 {}
impl PoolElement for u32 {}

/// Per-size-class counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    /// Length of buffers in this class.
    pub array_size: usize,
    /// Buffers handed out.
    pub get_ops: u64,
    /// Buffers freshly allocated because the free list was empty.
    pub create_ops: u64,
    /// Buffers accepted back onto the free list.
    pub return_ops: u64,
    /// High-water mark of the free list.
    pub max_retained: usize,
}

/// Cache-wide counters. Kept across generations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// One entry per size class.
    pub buckets: Vec<BucketStats>,
    /// Requests larger than the largest class (allocated directly, never cached).
    pub oversize: u64,
    /// `grow` calls that had to replace the buffer.
    pub resize: u64,
    /// Releases dropped because the class free list was full.
    pub dropped_on_release: u64,
    /// Releases dropped because the buffer length matched no class.
    pub bad_length: u64,
    /// Released buffers found dirty outside the cleared range and repaired.
    pub repaired: u64,
    /// Bucket generations built (the first build counts).
    pub generations: u64,
    /// Elements held by per-caller initial buffers.
    pub total_initial: usize,
}

struct Bucket<T> {
    array_size: usize,
    capacity: usize,
    arrays: Vec<Box<[T]>>,
}

impl<T: PoolElement> Bucket<T> {
    fn new(array_size: usize, capacity: usize) -> Self {
        Self {
            array_size,
            capacity,
            arrays: Vec::with_capacity(capacity),
        }
    }
}

/// Zero-filled buffer of exactly `len` elements.
pub(crate) fn create_array<T: PoolElement>(len: usize) -> Box<[T]> {
    vec![T::default(); len].into_boxed_slice()
}

/// Size-bucketed free lists of zero-filled buffers.
///
/// The free lists form one "generation" that [`drop_if_unused`](Self::drop_if_unused) may
/// discard at any time; the next access rebuilds an empty generation. Losing a generation
/// only costs fresh allocations.
pub struct ArrayCache<T: PoolElement> {
    name: &'static str,
    opts: PoolOpts,
    classes: SizeClasses,
    generation: Option<Vec<Bucket<T>>>,
    stats: PoolStats,
}

impl<T: PoolElement> fmt::Debug for ArrayCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayCache")
            .field("name", &self.name)
            .field("classes", &self.classes)
            .field("retained", &self.retained())
            .finish()
    }
}

impl<T: PoolElement> ArrayCache<T> {
    /// Build a cache; `name` only labels log events.
    pub fn new(name: &'static str, opts: PoolOpts) -> GammablendResult<Self> {
        opts.validate()?;
        let classes = SizeClasses::new(&opts);
        let buckets = (0..classes.len())
            .map(|i| BucketStats {
                array_size: classes.size(i),
                ..BucketStats::default()
            })
            .collect();
        Ok(Self {
            name,
            opts,
            classes,
            generation: None,
            stats: PoolStats {
                buckets,
                ..PoolStats::default()
            },
        })
    }

    /// Options this cache was built with.
    pub fn opts(&self) -> &PoolOpts {
        &self.opts
    }

    /// Size classes this cache recycles.
    pub fn classes(&self) -> &SizeClasses {
        &self.classes
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> PoolStats {
        self.stats.clone()
    }

    /// Free buffers currently retained across all classes.
    pub fn retained(&self) -> usize {
        self.generation
            .as_ref()
            .map_or(0, |g| g.iter().map(|b| b.arrays.len()).sum())
    }

    /// Drop every retained free buffer (memory-pressure hook). Returns how many were dropped.
    pub fn drop_if_unused(&mut self) -> usize {
        let dropped = self.retained();
        if self.generation.take().is_some() {
            tracing::debug!(cache = self.name, dropped, "dropped scratch generation");
        }
        dropped
    }

    fn buckets(&mut self) -> &mut Vec<Bucket<T>> {
        let classes = &self.classes;
        let capacity = self.opts.bucket_capacity;
        let stats = &mut self.stats;
        let name = self.name;
        self.generation.get_or_insert_with(|| {
            stats.generations += 1;
            tracing::debug!(
                cache = name,
                generation = stats.generations,
                "built scratch generation"
            );
            (0..classes.len())
                .map(|i| Bucket::new(classes.size(i), capacity))
                .collect()
        })
    }

    pub(crate) fn note_initial(&mut self, len: usize) {
        self.stats.total_initial += len;
    }

    pub(crate) fn note_resize(&mut self) {
        self.stats.resize += 1;
    }

    /// Zero-filled buffer of at least `len` elements.
    ///
    /// Lengths up to the largest class get exactly that class's length; longer requests are
    /// allocated at `len` and bypass the free lists.
    pub fn get(&mut self, len: usize) -> Box<[T]> {
        let Some(class) = self.classes.class_for(len) else {
            self.stats.oversize += 1;
            tracing::debug!(cache = self.name, len, "oversize scratch request");
            return create_array(len);
        };

        self.stats.buckets[class].get_ops += 1;
        let bucket = &mut self.buckets()[class];
        if let Some(array) = bucket.arrays.pop() {
            return array;
        }
        let array_size = bucket.array_size;
        self.stats.buckets[class].create_ops += 1;
        create_array(array_size)
    }

    /// Zero `[from, to)` and return `array` to its class free list.
    ///
    /// Buffers longer than the largest class are dropped silently; lengths matching no class
    /// and releases into a full class are dropped and logged.
    pub fn put(&mut self, mut array: Box<[T]>, from: usize, to: usize) {
        let len = array.len();
        if len > self.classes.max() {
            return;
        }
        let Some(class) = self.classes.class_of(len) else {
            self.stats.bad_length += 1;
            tracing::warn!(cache = self.name, len, "released buffer matches no size class");
            return;
        };

        if clear_range(&mut array, from, to, self.opts.check_zeroed, self.name) {
            self.stats.repaired += 1;
        }

        let bucket = &mut self.buckets()[class];
        if bucket.arrays.len() >= bucket.capacity {
            let array_size = bucket.array_size;
            self.stats.dropped_on_release += 1;
            tracing::debug!(cache = self.name, array_size, "scratch class capacity exceeded");
            return;
        }
        bucket.arrays.push(array);
        let retained = bucket.arrays.len();

        let st = &mut self.stats.buckets[class];
        st.return_ops += 1;
        st.max_retained = st.max_retained.max(retained);
    }
}

/// Zero `[from, to)` of `array`; with `check` also scan the whole buffer and re-zero it
/// when anything outside the range was dirty. Returns `true` when a repair happened.
pub(crate) fn clear_range<T: PoolElement>(
    array: &mut [T],
    from: usize,
    to: usize,
    check: bool,
    name: &'static str,
) -> bool {
    let len = array.len();
    let to = to.min(len);
    let from = from.min(to);
    if to != 0 {
        array[from..to].fill(T::default());
    }

    if !check {
        return false;
    }
    match array.iter().position(|v| *v != T::default()) {
        None => false,
        Some(at) => {
            tracing::warn!(
                cache = name,
                at,
                value = ?array[at],
                from,
                to,
                "scratch buffer dirty outside released range"
            );
            array.fill(T::default());
            true
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/cache.rs"]
mod tests;
