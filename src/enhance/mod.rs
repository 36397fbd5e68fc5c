//! Enhancement engine: parameter validation, the base colour transform and
//! the render pipeline that combines it with the pixel kernels.

pub mod filters;
pub mod params;
pub mod render;
