pub(crate) mod compose;
pub(crate) mod context;
pub(crate) mod fast_path;
pub(crate) mod memo;
