use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Valid range of the brightness, contrast and exposure percentages.
pub const PERCENT_RANGE: (f32, f32) = (50.0, 150.0);
/// Valid range of the saturation percentage.
pub const SATURATION_RANGE: (f32, f32) = (0.0, 300.0);
/// Valid range of the skin smoothing strength (box blur radius).
pub const SKIN_SMOOTH_RANGE: (f32, f32) = (0.0, 10.0);
/// Valid range of the sharpening amount.
pub const SHARPNESS_RANGE: (f32, f32) = (0.0, 5.0);

/// Parameter set of the enhancement engine.
///
/// Percentages are expressed the way the sliders show them: `100` is the
/// neutral value. Missing fields deserialize to their neutral value, so
/// records persisted before a field existed still load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhancementParams {
    /// Brightness percentage, `50..=150`
    pub brightness: f32,
    /// Contrast percentage, `50..=150`
    pub contrast: f32,
    /// Saturation percentage, `0..=300`
    pub saturation: f32,
    /// Exposure percentage, `50..=150`; a second brightness stage
    pub exposure: f32,
    /// Skin smoothing strength, `0..=10`
    pub skin_smooth: f32,
    /// Sharpening amount, `0..=5`
    pub sharpness: f32,
}

impl Default for EnhancementParams {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            exposure: 100.0,
            skin_smooth: 0.0,
            sharpness: 0.0,
        }
    }
}

impl EnhancementParams {
    /// Checks every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// * `ParamError::OutOfRange` - For the first parameter outside its range
    pub fn validate(&self) -> Result<(), ParamError> {
        check("brightness", self.brightness, PERCENT_RANGE)?;
        check("contrast", self.contrast, PERCENT_RANGE)?;
        check("saturation", self.saturation, SATURATION_RANGE)?;
        check("exposure", self.exposure, PERCENT_RANGE)?;
        check("skinSmooth", self.skin_smooth, SKIN_SMOOTH_RANGE)?;
        check("sharpness", self.sharpness, SHARPNESS_RANGE)
    }

    /// Whether rendering with these parameters reproduces the original.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Box blur radius used by skin smoothing.
    pub fn blur_radius(&self) -> u32 {
        self.skin_smooth.max(0.0).round() as u32
    }
}

fn check(name: &'static str, value: f32, (min, max): (f32, f32)) -> Result<(), ParamError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ParamError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
