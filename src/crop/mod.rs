//! Crop transform: aspect-ratio presets, coordinate spaces, the interactive
//! crop session and the application of a committed crop to pixels.

pub mod apply;
pub mod geometry;
pub mod presets;
pub mod session;
