pub(crate) mod cache;
pub(crate) mod reference;
pub(crate) mod size_class;
