//! Image records, their undo/redo history and the persistence mirror.

pub mod persist;
pub mod record;
pub mod store;
