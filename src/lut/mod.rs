pub(crate) mod alpha;
pub(crate) mod gamma;
