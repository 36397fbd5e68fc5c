use std::fmt;

use crate::error::CropError;

/// Suffix marking the reciprocal orientation of a preset label.
const ROTATED_SUFFIX: &str = " (rotated)";

/// A named fixed aspect ratio, stored as width and height proportions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectPreset {
    pub label: &'static str,
    pub width: f64,
    pub height: f64,
}

/// Registered fixed presets: screen ratios, passport and photo-print sizes.
pub const PRESETS: &[AspectPreset] = &[
    AspectPreset { label: "1:1", width: 1.0, height: 1.0 },
    AspectPreset { label: "4:3", width: 4.0, height: 3.0 },
    AspectPreset { label: "16:9", width: 16.0, height: 9.0 },
    AspectPreset { label: "3:4", width: 3.0, height: 4.0 },
    AspectPreset { label: "Passport", width: 35.0, height: 45.0 },
    AspectPreset { label: "2R", width: 2.5, height: 3.5 },
    AspectPreset { label: "3R", width: 3.5, height: 5.0 },
    AspectPreset { label: "4R", width: 4.0, height: 6.0 },
    AspectPreset { label: "5R", width: 5.0, height: 7.0 },
    AspectPreset { label: "6R", width: 6.0, height: 8.0 },
    AspectPreset { label: "8R", width: 8.0, height: 10.0 },
    AspectPreset { label: "10R", width: 10.0, height: 12.0 },
];

/// Label of the unconstrained mode.
pub const FREE_LABEL: &str = "Free";

/// Aspect-ratio constraint of a crop box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectRatio {
    /// Width and height move independently.
    Free,
    /// `height = width / ratio`; `rotated` selects the reciprocal orientation.
    Fixed {
        preset: AspectPreset,
        rotated: bool,
    },
    /// 1:1, the ratio a crop session opens with.
    #[default]
    Square,
}

impl AspectRatio {
    /// Looks a ratio up by label.
    ///
    /// Accepts `"Free"`, any registered preset label and a preset label
    /// followed by `" (rotated)"`.
    ///
    /// # Errors
    ///
    /// * `CropError::UnknownPreset` - When no preset matches
    pub fn from_label(label: &str) -> Result<Self, CropError> {
        if label == FREE_LABEL {
            return Ok(Self::Free);
        }
        let (base, rotated) = match label.strip_suffix(ROTATED_SUFFIX) {
            Some(base) => (base, true),
            None => (label, false),
        };
        PRESETS
            .iter()
            .find(|preset| preset.label == base)
            .map(|preset| Self::fixed(*preset, rotated))
            .ok_or_else(|| CropError::UnknownPreset(label.to_string()))
    }

    fn fixed(preset: AspectPreset, rotated: bool) -> Self {
        if preset.label == "1:1" && !rotated {
            Self::Square
        } else {
            Self::Fixed { preset, rotated }
        }
    }

    /// Every selectable ratio: free-form, then each preset in both
    /// orientations.
    pub fn all() -> Vec<Self> {
        std::iter::once(Self::Free)
            .chain(
                PRESETS
                    .iter()
                    .flat_map(|p| [Self::fixed(*p, false), Self::fixed(*p, true)]),
            )
            .collect()
    }

    /// `width / height`, or `None` for free-form.
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Free => None,
            Self::Square => Some(1.0),
            Self::Fixed { preset, rotated: false } => Some(preset.width / preset.height),
            Self::Fixed { preset, rotated: true } => Some(preset.height / preset.width),
        }
    }

    /// Ratio sent to the face-detection service; free-form sends `1`.
    pub fn detection_ratio(&self) -> f64 {
        self.ratio().unwrap_or(1.0)
    }

    /// The same preset in the other orientation. Free-form is unchanged.
    pub fn reciprocal(&self) -> Self {
        match *self {
            Self::Free => Self::Free,
            Self::Square => Self::Fixed {
                preset: PRESETS[0],
                rotated: true,
            },
            Self::Fixed { preset, rotated } => Self::fixed(preset, !rotated),
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => f.write_str(FREE_LABEL),
            Self::Square => f.write_str(PRESETS[0].label),
            Self::Fixed { preset, rotated } => {
                f.write_str(preset.label)?;
                if *rotated {
                    f.write_str(ROTATED_SUFFIX)?;
                }
                Ok(())
            }
        }
    }
}
