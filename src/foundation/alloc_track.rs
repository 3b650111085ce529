//! Heap accounting for hot-loop tests.
//!
//! With `alloc-track` enabled the crate installs an instrumented global allocator, so a
//! region can report how many allocations happened while compositing or recycling buffers.
//! Without the feature every region reports zero.

#[cfg(feature = "alloc-track")]
mod imp {
    use stats_alloc::{INSTRUMENTED_SYSTEM, Region, StatsAlloc};
    use std::alloc::System;

    #[global_allocator]
    static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

    /// Allocator activity since a region started.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AllocDelta {
        /// Number of allocations.
        pub allocations: usize,
        /// Number of reallocations.
        pub reallocations: usize,
        /// Bytes handed out by allocations and reallocations.
        pub bytes_allocated: usize,
    }

    /// Snapshot of the global allocator counters.
    pub struct AllocRegion {
        region: Region<'static, System>,
    }

    impl AllocRegion {
        /// Start counting from now.
        pub fn start() -> Self {
            Self {
                region: Region::new(GLOBAL),
            }
        }

        /// Activity since [`start`](Self::start).
        pub fn delta(&self) -> AllocDelta {
            let s = self.region.change();
            AllocDelta {
                allocations: s.allocations,
                reallocations: s.reallocations,
                bytes_allocated: s.bytes_allocated,
            }
        }
    }
}

#[cfg(not(feature = "alloc-track"))]
mod imp {
    /// Allocator activity since a region started.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AllocDelta {
        /// Number of allocations.
        pub allocations: usize,
        /// Number of reallocations.
        pub reallocations: usize,
        /// Bytes handed out by allocations and reallocations.
        pub bytes_allocated: usize,
    }

    /// Snapshot of the global allocator counters.
    pub struct AllocRegion;

    impl AllocRegion {
        /// Start counting from now.
        pub fn start() -> Self {
            Self
        }

        /// Activity since [`start`](Self::start).
        pub fn delta(&self) -> AllocDelta {
            AllocDelta::default()
        }
    }
}

pub use imp::{AllocDelta, AllocRegion};
