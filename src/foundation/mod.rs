pub(crate) mod alloc_track;
pub(crate) mod config;
pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
