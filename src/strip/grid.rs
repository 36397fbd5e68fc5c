use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::StripError;

/// Background used when none is given.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// Grid parameters of a photo strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    /// Gap between neighbouring tiles in full-resolution pixels.
    pub spacing_px: u32,
    /// `#RGB` or `#RRGGBB`.
    pub background_color: String,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 3,
            spacing_px: 10,
            background_color: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl GridSpec {
    pub fn new(rows: u32, cols: u32, spacing_px: u32, background_color: impl Into<String>) -> Self {
        Self {
            rows,
            cols,
            spacing_px,
            background_color: background_color.into(),
        }
    }

    /// Checks the grid size and parses the background colour.
    ///
    /// # Errors
    ///
    /// * `StripError::InvalidGrid` - When rows or cols are outside `1..=max_cells`
    /// * `StripError::InvalidColor` - When the colour is not hex
    pub fn validate(&self, max_cells: u32) -> Result<Rgba<u8>, StripError> {
        let in_range = |n: u32| (1..=max_cells).contains(&n);
        if !in_range(self.rows) || !in_range(self.cols) {
            return Err(StripError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
                max: max_cells,
            });
        }
        parse_hex_color(&self.background_color)
    }
}

/// Parses `#RGB` or `#RRGGBB` (the `#` is optional) into an opaque colour.
///
/// # Errors
///
/// * `StripError::InvalidColor` - For any other input
pub fn parse_hex_color(input: &str) -> Result<Rgba<u8>, StripError> {
    let invalid = || StripError::InvalidColor(input.to_string());
    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    let [r, g, b] = match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (slot, i) in out.iter_mut().zip(0..3) {
                *slot = channel(&hex[i..=i])? * 0x11;
            }
            out
        }
        6 => [
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ],
        _ => return Err(invalid()),
    };

    Ok(Rgba([r, g, b, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_hex_color("#FFFFFF").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("#1e90ff").unwrap(), Rgba([30, 144, 255, 255]));
        assert_eq!(parse_hex_color("#f80").unwrap(), Rgba([255, 136, 0, 255]));
        assert_eq!(parse_hex_color("000").unwrap(), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rejects_malformed_colours() {
        for input in ["", "#", "#12", "#12345", "#GGGGGG", "red", "#ffé"] {
            assert!(
                matches!(parse_hex_color(input), Err(StripError::InvalidColor(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn default_grid_matches_passport_sheet() {
        let grid = GridSpec::default();
        assert_eq!((grid.rows, grid.cols, grid.spacing_px), (2, 3, 10));
        assert_eq!(grid.validate(10).unwrap(), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn grid_limits() {
        assert!(matches!(
            GridSpec::new(0, 3, 10, "#fff").validate(10),
            Err(StripError::InvalidGrid { rows: 0, .. })
        ));
        assert!(GridSpec::new(11, 1, 0, "#fff").validate(10).is_err());
        assert!(GridSpec::new(10, 10, 0, "#fff").validate(10).is_ok());
    }
}
