//! Editor configuration. Every field has a default, so a partial JSON file
//! (or none at all) is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::OutputFormat;
use crate::error::StorageError;

/// Strip compositor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StripConfig {
    /// Tile height of the full-resolution strip: 45 mm at 300 dpi.
    pub tile_height: u32,
    /// Tile width of the live preview.
    pub preview_tile_width: u32,
    /// Upper bound for rows and for columns.
    pub max_cells_per_axis: u32,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            tile_height: 531,
            preview_tile_width: 100,
            max_cells_per_axis: 10,
        }
    }
}

/// Defaults offered by the export surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportDefaults {
    pub format: OutputFormat,
    /// JPEG quality, `10..=100`
    pub quality: u8,
    /// Scale percentage, `10..=200`
    pub scale_percent: u32,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 90,
            scale_percent: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Minimum crop side in source pixels.
    pub min_crop_size: u32,
    /// Share of the display covered by a freshly opened crop box.
    pub auto_crop_area: f64,
    /// Encoding of rendered records and previews.
    pub preview_format: OutputFormat,
    pub preview_quality: u8,
    pub strip: StripConfig,
    pub export: ExportDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_crop_size: 10,
            auto_crop_area: 0.8,
            preview_format: OutputFormat::Jpeg,
            preview_quality: 92,
            strip: StripConfig::default(),
            export: ExportDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Reads a configuration from a JSON file; missing fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// * `StorageError::Io` - When the file cannot be read
    /// * `StorageError::Serialization` - When the file is not valid JSON
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.min_crop_size, 10);
        assert_eq!(config.strip.tile_height, 531);
        assert_eq!(config.strip.preview_tile_width, 100);
        assert_eq!(config.export.quality, 90);
        assert_eq!(config.preview_format, OutputFormat::Jpeg);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        fs::write(
            &path,
            r#"{ "minCropSize": 32, "strip": { "tileHeight": 600 }, "export": { "format": "png" } }"#,
        )
        .unwrap();

        let config = EditorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.min_crop_size, 32);
        assert_eq!(config.strip.tile_height, 600);
        assert_eq!(config.strip.max_cells_per_axis, 10);
        assert_eq!(config.export.format, OutputFormat::Png);
        assert_eq!(config.export.quality, 90);
        assert_eq!(config.auto_crop_area, 0.8);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EditorConfig::from_json_file(dir.path().join("absent.json")),
            Err(StorageError::Io(_))
        ));
    }
}
