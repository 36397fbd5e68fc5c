//! Strip compositor: one region repeated over a grid with spacing and a
//! background fill.

pub mod compose;
pub mod grid;
pub mod layout;
