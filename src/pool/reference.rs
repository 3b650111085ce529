use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::config::PoolOpts;
use crate::foundation::error::GammablendResult;
use crate::pool::cache::{ArrayCache, PoolElement, PoolStats, clear_range, create_array};
use crate::pool::size_class::grown_size;

/// Per-thread handle to a shared [`ArrayCache`].
///
/// Cloning shares the same cache. The handle is `!Send`: one pool per rendering thread.
pub struct ScratchPool<T: PoolElement> {
    cache: Rc<RefCell<ArrayCache<T>>>,
}

impl<T: PoolElement> Clone for ScratchPool<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Rc::clone(&self.cache),
        }
    }
}

impl<T: PoolElement> std::fmt::Debug for ScratchPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScratchPool").field(&self.cache.borrow()).finish()
    }
}

impl<T: PoolElement> ScratchPool<T> {
    /// Build a pool; `name` only labels log events.
    pub fn new(name: &'static str, opts: PoolOpts) -> GammablendResult<Self> {
        Ok(Self {
            cache: Rc::new(RefCell::new(ArrayCache::new(name, opts)?)),
        })
    }

    /// Register a caller owning an exempt initial buffer of `initial_size` elements.
    pub fn reference(&self, initial_size: usize) -> ScratchRef<T> {
        self.cache.borrow_mut().note_initial(initial_size);
        let initial = create_array(initial_size);
        ScratchRef {
            pool: self.clone(),
            initial_id: buffer_id(&initial),
            initial: Some(initial),
        }
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> PoolStats {
        self.cache.borrow().stats()
    }

    /// Free buffers currently retained.
    pub fn retained(&self) -> usize {
        self.cache.borrow().retained()
    }

    /// Memory-pressure hook: drop all retained free buffers. Returns how many were dropped.
    pub fn drop_if_unused(&self) -> usize {
        self.cache.borrow_mut().drop_if_unused()
    }
}

/// Identity of a live buffer: its address and length. Empty buffers have no identity.
fn buffer_id<T>(buf: &[T]) -> Option<(usize, usize)> {
    if buf.is_empty() {
        return None;
    }
    Some((buf.as_ptr() as usize, buf.len()))
}

/// One caller's view of a [`ScratchPool`].
///
/// Owns a small initial buffer that is never placed in the shared free lists, so a caller's
/// baseline scratch space is never handed to another caller or cleared under it.
pub struct ScratchRef<T: PoolElement> {
    pool: ScratchPool<T>,
    initial: Option<Box<[T]>>,
    initial_id: Option<(usize, usize)>,
}

impl<T: PoolElement> std::fmt::Debug for ScratchRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchRef")
            .field("initial_len", &self.initial_id.map_or(0, |(_, len)| len))
            .field("initial_lent", &self.initial.is_none())
            .finish()
    }
}

impl<T: PoolElement> ScratchRef<T> {
    /// Take the initial buffer (zero-filled).
    ///
    /// When it is already lent out the caller gets an ordinary pooled buffer of at least the
    /// initial length instead. The initial buffer keeps its identity, so only it is ever held
    /// back from the shared free lists.
    pub fn initial(&mut self) -> Box<[T]> {
        if let Some(buf) = self.initial.take() {
            return buf;
        }
        let len = self.initial_id.map_or(0, |(_, len)| len);
        tracing::debug!(len, "initial scratch buffer already lent; using a pooled buffer");
        self.acquire(len)
    }

    /// Return `true` when `buf` is this reference's initial buffer.
    pub fn is_initial(&self, buf: &[T]) -> bool {
        self.initial_id.is_some() && buffer_id(buf) == self.initial_id
    }

    /// Zero-filled buffer of at least `len` elements.
    pub fn acquire(&self, len: usize) -> Box<[T]> {
        self.pool.cache.borrow_mut().get(len)
    }

    /// Hand `buf` back after use; `[dirty_from, dirty_to)` is the range the caller wrote.
    pub fn release(&mut self, mut buf: Box<[T]>, dirty_from: usize, dirty_to: usize) {
        if buf.is_empty() {
            return;
        }
        if self.is_initial(&buf) {
            let check = self.pool.cache.borrow().opts().check_zeroed;
            clear_range(&mut buf, dirty_from, dirty_to, check, "initial");
            self.initial = Some(buf);
            return;
        }
        self.pool.cache.borrow_mut().put(buf, dirty_from, dirty_to);
    }

    /// Ensure `buf` holds at least `needed` elements, keeping its first `used` ones.
    ///
    /// Returns `buf` unchanged when it is already long enough. Otherwise the replacement is
    /// strictly longer than `needed`, and `buf` is released with dirty range `[0, used)`.
    pub fn grow(&mut self, buf: Box<[T]>, used: usize, needed: usize) -> Box<[T]> {
        if buf.len() >= needed {
            return buf;
        }
        let used = used.min(buf.len());

        let new_len = {
            let mut cache = self.pool.cache.borrow_mut();
            cache.note_resize();
            grown_size(used, needed, cache.opts().threshold_array_size)
        };
        let mut res = self.acquire(new_len);
        res[..used].copy_from_slice(&buf[..used]);

        tracing::debug!(
            old_len = buf.len(),
            new_len = res.len(),
            used,
            needed,
            "grew scratch buffer"
        );
        self.release(buf, 0, used);
        res
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/reference.rs"]
mod tests;
