use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::DataUrl;
use crate::crop::geometry::CropGeometry;
use crate::enhance::params::EnhancementParams;

/// Default display label for records persisted without a name.
const UNNAMED: &str = "image";

/// Stable identity of a record, independent of its collection index.
///
/// `0` marks a record loaded without an id; the store assigns a fresh one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const UNASSIGNED: Self = Self(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a record is, minus its history stacks.
///
/// This is also the shape of every undo/redo snapshot, so history never
/// nests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredState")]
pub struct RecordState {
    pub id: RecordId,
    pub name: String,
    /// Immutable source bitmap.
    pub original_url: DataUrl,
    pub original_width: u32,
    pub original_height: u32,
    /// Committed crop, in source pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_data: Option<CropGeometry>,
    pub enhancement_settings: EnhancementParams,
    /// Current rendered output; equals `original_url` until an edit is saved.
    pub url: DataUrl,
}

impl RecordState {
    pub fn new(id: RecordId, name: impl Into<String>, original: DataUrl, size: (u32, u32)) -> Self {
        Self {
            id,
            name: name.into(),
            url: original.clone(),
            original_url: original,
            original_width: size.0,
            original_height: size.1,
            crop_data: None,
            enhancement_settings: EnhancementParams::default(),
        }
    }

    pub fn original_size(&self) -> (u32, u32) {
        (self.original_width, self.original_height)
    }

    /// Whether no crop or enhancement has been committed.
    pub fn is_pristine(&self) -> bool {
        self.crop_data.is_none() && self.enhancement_settings.is_identity()
    }
}

/// Persisted form accepted on load. Every field except an image is
/// optional; records saved before `originalUrl` existed only carry `url`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    id: RecordId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    original_url: Option<DataUrl>,
    #[serde(default)]
    original_width: u32,
    #[serde(default)]
    original_height: u32,
    #[serde(default)]
    crop_data: Option<CropGeometry>,
    #[serde(default)]
    enhancement_settings: Option<EnhancementParams>,
    #[serde(default)]
    url: Option<DataUrl>,
}

impl TryFrom<StoredState> for RecordState {
    type Error = String;

    fn try_from(stored: StoredState) -> Result<Self, Self::Error> {
        let (original_url, url) = match (stored.original_url, stored.url) {
            (Some(original), Some(url)) => (original, url),
            (Some(original), None) => (original.clone(), original),
            (None, Some(url)) => (url.clone(), url),
            (None, None) => return Err("record has neither `originalUrl` nor `url`".to_string()),
        };

        let (mut original_width, mut original_height) =
            (stored.original_width, stored.original_height);
        if original_width == 0 || original_height == 0 {
            // Older records carry no size; read it from the image header.
            if let Ok((w, h)) = original_url.dimensions() {
                original_width = w;
                original_height = h;
            }
        }

        Ok(Self {
            id: stored.id,
            name: stored
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNNAMED.to_string()),
            original_url,
            original_width,
            original_height,
            crop_data: stored.crop_data,
            enhancement_settings: stored.enhancement_settings.unwrap_or_default(),
            url,
        })
    }
}

/// One editable photo: its current state plus its undo and redo stacks
/// (most recent last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(flatten)]
    pub state: RecordState,
    #[serde(default)]
    pub edit_history: Vec<RecordState>,
    #[serde(default)]
    pub redo_history: Vec<RecordState>,
}

impl ImageRecord {
    pub fn new(state: RecordState) -> Self {
        Self {
            state,
            edit_history: Vec::new(),
            redo_history: Vec::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn can_undo(&self) -> bool {
        !self.edit_history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_history.is_empty()
    }
}

/// Fields replaced by a commit. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the crop.
    pub crop_data: Option<Option<CropGeometry>>,
    pub enhancement_settings: Option<EnhancementParams>,
    pub url: Option<DataUrl>,
}

impl RecordPatch {
    pub fn apply(self, state: &mut RecordState) {
        if let Some(name) = self.name {
            state.name = name;
        }
        if let Some(crop) = self.crop_data {
            state.crop_data = crop;
        }
        if let Some(params) = self.enhancement_settings {
            state.enhancement_settings = params;
        }
        if let Some(url) = self.url {
            state.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_gradient_rgba_image, png_data_url};

    fn sample_state() -> RecordState {
        let url = png_data_url(&create_gradient_rgba_image(4, 3));
        RecordState::new(RecordId(7), "portrait.png", url, (4, 3))
    }

    #[test]
    fn new_state_is_pristine() {
        let state = sample_state();
        assert!(state.is_pristine());
        assert_eq!(state.url, state.original_url);
        assert_eq!(state.original_size(), (4, 3));
    }

    #[test]
    fn record_json_uses_flat_camel_case_fields() {
        let record = ImageRecord::new(sample_state());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], 7);
        assert!(json["originalUrl"].is_string());
        assert!(json["enhancementSettings"].is_object());
        assert!(json["editHistory"].as_array().unwrap().is_empty());
        assert!(json.get("cropData").is_none());
        assert!(json.get("state").is_none());

        let back: ImageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn legacy_record_without_optional_fields_loads() {
        let url = png_data_url(&create_gradient_rgba_image(5, 2));
        let json = serde_json::json!({ "url": url.as_str(), "name": "old.png" });
        let record: ImageRecord = serde_json::from_value(json).unwrap();

        assert_eq!(record.id(), RecordId::UNASSIGNED);
        assert_eq!(record.state.original_url, url);
        assert_eq!(record.state.original_size(), (5, 2));
        assert_eq!(record.state.crop_data, None);
        assert!(record.state.enhancement_settings.is_identity());
        assert!(!record.can_undo());
        assert!(!record.can_redo());
    }

    #[test]
    fn record_without_any_image_is_rejected() {
        let json = serde_json::json!({ "name": "nothing" });
        assert!(serde_json::from_value::<ImageRecord>(json).is_err());
    }

    #[test]
    fn patch_replaces_only_given_fields() {
        let mut state = sample_state();
        let crop = CropGeometry {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            rotation_degrees: 0.0,
            aspect_ratio_label: None,
        };

        RecordPatch {
            crop_data: Some(Some(crop.clone())),
            ..Default::default()
        }
        .apply(&mut state);
        assert_eq!(state.crop_data, Some(crop));
        assert_eq!(state.name, "portrait.png");

        RecordPatch {
            crop_data: Some(None),
            name: Some("renamed".to_string()),
            ..Default::default()
        }
        .apply(&mut state);
        assert_eq!(state.crop_data, None);
        assert_eq!(state.name, "renamed");
    }
}
