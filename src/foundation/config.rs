use serde::{Deserialize, Serialize};

use crate::foundation::error::{GammablendError, GammablendResult};

/// Size classes and retention limits for a scratch array cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOpts {
    /// Length of the smallest size class (elements).
    pub min_array_size: usize,
    /// Number of size classes; each is 4x the previous one.
    pub bucket_count: usize,
    /// Maximum number of free buffers retained per size class.
    pub bucket_capacity: usize,
    /// Above this length `grow` switches from 2x to 1.5x growth.
    pub threshold_array_size: usize,
    /// Scan the whole buffer after clearing on release and repair stray non-zero elements.
    pub check_zeroed: bool,
}

impl Default for PoolOpts {
    fn default() -> Self {
        Self {
            min_array_size: 4096,
            bucket_count: 8,
            bucket_capacity: 8,
            threshold_array_size: 16 * 1024 * 1024,
            check_zeroed: cfg!(debug_assertions),
        }
    }
}

impl PoolOpts {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> GammablendResult<Self> {
        let opts: Self =
            serde_json::from_str(s).map_err(|e| GammablendError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Largest size class; longer requests bypass the cache.
    ///
    /// Zero when `bucket_count` is zero; saturates at `usize::MAX` when the classes overflow.
    /// [`validate`](Self::validate) rejects both.
    pub fn max_array_size(&self) -> usize {
        if self.bucket_count == 0 {
            return 0;
        }
        self.checked_max_array_size().unwrap_or(usize::MAX)
    }

    fn checked_max_array_size(&self) -> Option<usize> {
        let shift = self.bucket_count.checked_sub(1)?.checked_mul(2)?;
        let shift = u32::try_from(shift).ok()?;
        self.min_array_size
            .checked_shl(shift)
            .filter(|m| m >> shift == self.min_array_size)
    }

    /// Reject option combinations the cache cannot honor.
    pub fn validate(&self) -> GammablendResult<()> {
        if self.min_array_size == 0 {
            return Err(GammablendError::validation(
                "pool min_array_size must be >= 1",
            ));
        }
        if self.bucket_count == 0 {
            return Err(GammablendError::validation("pool bucket_count must be >= 1"));
        }
        if self.checked_max_array_size().is_none() {
            return Err(GammablendError::validation(format!(
                "pool size classes overflow: min_array_size={} bucket_count={}",
                self.min_array_size, self.bucket_count
            )));
        }
        Ok(())
    }
}

/// Threading controls for [`compose_parallel`](crate::compose_parallel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendThreading {
    /// Enable row-parallel compositing when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Tiles with fewer rows are composed on the calling thread.
    pub min_rows: usize,
}

impl Default for BlendThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            min_rows: 64,
        }
    }
}

/// Compositor options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendOpts {
    /// Reuse the previous output pixel when source, destination and alpha repeat.
    pub memoize_results: bool,
    /// Row-parallel execution controls.
    pub threading: BlendThreading,
}

impl Default for BlendOpts {
    fn default() -> Self {
        Self {
            memoize_results: true,
            threading: BlendThreading::default(),
        }
    }
}

impl BlendOpts {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> GammablendResult<Self> {
        let opts: Self =
            serde_json::from_str(s).map_err(|e| GammablendError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject option combinations the compositor cannot honor.
    pub fn validate(&self) -> GammablendResult<()> {
        if let Some(n) = self.threading.threads
            && n == 0
        {
            return Err(GammablendError::validation(
                "blend threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
